//! # overview-core
//!
//! Interval partitioning and hierarchical summaries of calendar items.
//!
//! ## Key Types
//!
//! - [`DateInterval`] - Half-open `[start, end)` range in a time zone
//! - [`Granularity`] - Calendar-relative step (days, weeks, months, years)
//! - [`Intervals`] - Lazy partition of an interval produced by [`enumerate`]
//! - [`Summary`] - A bucket pairing an interval and context with its items
//! - [`EventSource`] - Where calendar items come from
//! - [`Summarizer`] - Builds summary trees from an event source
//!
//! The summarizer never performs I/O itself; everything it reads goes
//! through the [`EventSource`] it was built with.

mod calendar;
mod error;
mod granularity;
mod interval;
mod source;
mod summarizer;
mod summary;

pub use calendar::CalendarContext;
pub use error::CalendarError;
pub use granularity::Granularity;
pub use interval::{enumerate, DateInterval, EndPolicy, Intervals};
pub use source::{
    Calendar, CalendarId, CalendarItem, EventSource, MemorySource, UNKNOWN_TITLE,
};
pub use summarizer::{group_by_title, Hierarchy, Summarizer};
pub use summary::{ItemCount, PeriodSummary, Summary, SummaryNode, TitleSummary};
