use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::interval::DateInterval;

/// Title used for items that have none.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Identifier of a calendar within an event source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarId(String);

impl CalendarId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CalendarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CalendarId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CalendarId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for CalendarId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: CalendarId,
    pub title: String,
}

impl Calendar {
    pub fn new(id: impl Into<CalendarId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A single (already expanded) calendar entry owned by the event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarItem {
    pub id: String,
    pub calendar_id: CalendarId,
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
}

impl CalendarItem {
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<CalendarId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: None,
            start,
            end,
            all_day: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn all_day_event(mut self) -> Self {
        self.all_day = true;
        self
    }

    /// The grouping key: the title, or [`UNKNOWN_TITLE`] when absent.
    pub fn title_or_unknown(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }

    pub fn intersects(&self, interval: &DateInterval) -> bool {
        interval.intersects(&self.start, &self.end)
    }
}

/// Read access to a store of calendar items.
///
/// Implementations may block; the summarizer calls `query_items` once per
/// summarization.
pub trait EventSource: Send + Sync {
    /// Every calendar the source knows about.
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError>;

    /// Resolve a calendar by id, `Ok(None)` when it does not exist.
    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError>;

    /// Items whose extent intersects `interval`, restricted to `calendars`
    /// when given. No ordering is guaranteed.
    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError>;
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        (**self).calendars()
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        (**self).calendar(id)
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        (**self).query_items(interval, calendars)
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        (**self).calendars()
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        (**self).calendar(id)
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        (**self).query_items(interval, calendars)
    }
}

impl<S: EventSource + ?Sized> EventSource for Arc<S> {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        (**self).calendars()
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        (**self).calendar(id)
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        (**self).query_items(interval, calendars)
    }
}

/// An event source over items held in memory.
///
/// Returns items in insertion order and counts queries, which makes it the
/// fake of choice in tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    calendars: Vec<Calendar>,
    items: Vec<CalendarItem>,
    failure: Option<String>,
    queries: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendars.push(calendar);
        self
    }

    pub fn with_item(mut self, item: CalendarItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = CalendarItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Make every item query fail with `CalendarError::Source(message)`.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of `query_items` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl EventSource for MemorySource {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        Ok(self.calendars.clone())
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        Ok(self.calendars.iter().find(|c| &c.id == id).cloned())
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(ref message) = self.failure {
            return Err(CalendarError::Source(message.clone()));
        }

        Ok(self
            .items
            .iter()
            .filter(|item| item.intersects(interval))
            .filter(|item| calendars.map_or(true, |ids| ids.contains(&item.calendar_id)))
            .cloned()
            .collect())
    }
}
