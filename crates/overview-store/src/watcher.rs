use std::path::PathBuf;

use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use overview_core::CalendarId;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::parser::{calendar_id, parse_calendar_file};
use crate::store::{is_calendar_file, CalendarStore};

/// Events emitted when calendar files change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CalendarEvent {
    CalendarCreated { id: CalendarId },
    CalendarUpdated { id: CalendarId, events: usize },
    CalendarRemoved { id: CalendarId },
}

impl CalendarEvent {
    pub fn id(&self) -> &CalendarId {
        match self {
            Self::CalendarCreated { id }
            | Self::CalendarUpdated { id, .. }
            | Self::CalendarRemoved { id } => id,
        }
    }
}

/// Watches the calendars directory and emits a [`CalendarEvent`] per
/// changed calendar file, so summaries can be rebuilt.
pub struct CalendarWatcher {
    tx: broadcast::Sender<CalendarEvent>,
    _watcher: RecommendedWatcher,
}

impl CalendarWatcher {
    /// Create a new watcher on the default calendars directory.
    pub fn new() -> Result<Self> {
        let calendars_dir = CalendarStore::default_dir()?;

        // Ensure the directory exists before watching
        std::fs::create_dir_all(&calendars_dir)?;

        Self::with_dir(calendars_dir)
    }

    /// Create a watcher on a custom directory.
    pub fn with_dir(calendars_dir: PathBuf) -> Result<Self> {
        let (tx, _) = broadcast::channel(256);
        let tx_clone = tx.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => Self::handle_event(&tx_clone, &event),
                Err(e) => tracing::warn!("Calendar watch error: {}", e),
            }
        })?;

        watcher.watch(&calendars_dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching {:?} for calendar changes", calendars_dir);

        Ok(Self {
            tx,
            _watcher: watcher,
        })
    }

    /// Subscribe to calendar events.
    pub fn subscribe(&self) -> broadcast::Receiver<CalendarEvent> {
        self.tx.subscribe()
    }

    fn handle_event(tx: &broadcast::Sender<CalendarEvent>, event: &Event) {
        for path in event.paths.iter().filter(|p| is_calendar_file(p)) {
            let id = calendar_id(path);

            let calendar_event = match event.kind {
                EventKind::Create(_) => Some(CalendarEvent::CalendarCreated { id }),
                EventKind::Modify(_) => {
                    // A half-written file still counts as an update
                    let events = parse_calendar_file(path)
                        .map(|file| file.items.len())
                        .unwrap_or(0);
                    Some(CalendarEvent::CalendarUpdated { id, events })
                }
                EventKind::Remove(_) => Some(CalendarEvent::CalendarRemoved { id }),
                _ => None,
            };

            if let Some(evt) = calendar_event {
                let _ = tx.send(evt);
            }
        }
    }
}
