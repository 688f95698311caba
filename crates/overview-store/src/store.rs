use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use overview_core::{
    Calendar, CalendarError, CalendarId, CalendarItem, DateInterval, EventSource,
};

use crate::parser::{parse_calendar_file, parse_calendar_header};
use crate::types::CalendarFile;

const EXTENSION: &str = "jsonl";

/// Provides access to calendar files on disk.
///
/// Each `<id>.jsonl` file in the directory is one calendar.
pub struct CalendarStore {
    calendars_dir: PathBuf,
}

impl CalendarStore {
    /// Create a new CalendarStore using the default calendars directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            calendars_dir: Self::default_dir()?,
        })
    }

    /// Create a CalendarStore with a custom directory (useful for testing).
    pub fn with_dir(calendars_dir: PathBuf) -> Self {
        Self { calendars_dir }
    }

    /// `<data dir>/overview/calendars`
    pub fn default_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().with_context(|| "Could not determine data directory")?;
        Ok(data_dir.join("overview").join("calendars"))
    }

    pub fn calendars_dir(&self) -> &PathBuf {
        &self.calendars_dir
    }

    /// List calendars sorted by title. Files that fail to parse are skipped.
    pub fn list_calendars(&self) -> Result<Vec<Calendar>> {
        let mut calendars: Vec<Calendar> = self
            .calendar_paths()?
            .iter()
            .filter_map(|path| match parse_calendar_header(path) {
                Ok(calendar) => Some(calendar),
                Err(e) => {
                    tracing::warn!("Failed to parse calendar {:?}: {}", path, e);
                    None
                }
            })
            .collect();

        calendars.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(calendars)
    }

    /// Load a calendar and all of its events, `Ok(None)` if it does not exist.
    pub fn load(&self, id: &CalendarId) -> Result<Option<CalendarFile>> {
        let Some(path) = self.path_for(id).filter(|p| p.exists()) else {
            return Ok(None);
        };
        parse_calendar_file(&path).map(Some)
    }

    /// The file for `id`, or `None` when the id could name a path outside
    /// the calendars directory.
    fn path_for(&self, id: &CalendarId) -> Option<PathBuf> {
        let name = id.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            tracing::debug!("Rejecting calendar id {:?}", name);
            return None;
        }
        Some(self.calendars_dir.join(format!("{}.{}", name, EXTENSION)))
    }

    fn calendar_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.calendars_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.calendars_dir)
            .with_context(|| format!("Failed to read calendars dir: {:?}", self.calendars_dir))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if is_calendar_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn items_in(&self, id: &CalendarId, interval: &DateInterval) -> Result<Vec<CalendarItem>> {
        let Some(file) = self.load(id)? else {
            return Ok(Vec::new());
        };
        Ok(file
            .items
            .into_iter()
            .filter(|item| item.intersects(interval))
            .collect())
    }
}

pub(crate) fn is_calendar_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(EXTENSION)
}

fn source_error(e: anyhow::Error) -> CalendarError {
    CalendarError::Source(format!("{:#}", e))
}

impl EventSource for CalendarStore {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        self.list_calendars().map_err(source_error)
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        let Some(path) = self.path_for(id).filter(|p| p.exists()) else {
            return Ok(None);
        };
        parse_calendar_header(&path).map(Some).map_err(source_error)
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        let ids: Vec<CalendarId> = match calendars {
            Some(ids) => ids.to_vec(),
            None => self
                .calendar_paths()
                .map_err(source_error)?
                .iter()
                .map(|path| crate::parser::calendar_id(path))
                .collect(),
        };

        let mut items = Vec::new();
        for id in &ids {
            items.extend(self.items_in(id, interval).map_err(source_error)?);
        }

        tracing::debug!(
            "Queried {} calendar(s) in {:?}: {} item(s)",
            ids.len(),
            self.calendars_dir,
            items.len()
        );
        Ok(items)
    }
}
