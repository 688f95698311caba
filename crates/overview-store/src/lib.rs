pub mod parser;
pub mod store;
pub mod types;
pub mod watcher;

pub use parser::{parse_calendar_file, parse_calendar_header};
pub use store::CalendarStore;
pub use types::{CalendarFile, CalendarHeader, CalendarLine, EventLine};
pub use watcher::{CalendarEvent, CalendarWatcher};
