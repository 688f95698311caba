use thiserror::Error;

use crate::source::CalendarId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid date: calendar arithmetic could not be resolved")]
    InvalidDate,

    #[error("Unknown calendar: {0}")]
    UnknownCalendar(CalendarId),

    #[error("Event source error: {0}")]
    Source(String),

    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("Invalid interval: start is after end")]
    InvalidInterval,

    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),
}
