use overview_core::{CalendarError, CalendarId, Hierarchy, ItemCount};
use serde::Serialize;

/// What the summary screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "summaries", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    NoCalendarsSelected,
    Empty,
    Ready(Hierarchy),
    Failed(String),
}

impl ViewState {
    pub fn from_result(selection: &[CalendarId], result: Result<Hierarchy, CalendarError>) -> Self {
        match result {
            Err(e) => Self::Failed(e.to_string()),
            Ok(_) if selection.is_empty() => Self::NoCalendarsSelected,
            Ok(hierarchy) if hierarchy.item_count() == 0 => Self::Empty,
            Ok(hierarchy) => Self::Ready(hierarchy),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed(_) => 1,
            _ => 0,
        }
    }
}
