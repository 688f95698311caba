use chrono::{DateTime, Utc};
use overview_core::{Calendar, CalendarItem};
use serde::{Deserialize, Serialize};

/// One line of a calendar JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarLine {
    Calendar(CalendarHeader),
    Event(EventLine),
}

/// First line of every calendar file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarHeader {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLine {
    pub id: String,
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
}

/// A fully parsed calendar file.
#[derive(Debug, Clone)]
pub struct CalendarFile {
    pub calendar: Calendar,
    pub items: Vec<CalendarItem>,
}
