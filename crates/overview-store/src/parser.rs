use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use overview_core::{Calendar, CalendarId, CalendarItem};

use crate::types::{CalendarFile, CalendarLine};

/// The calendar id for a file: its stem.
pub fn calendar_id(path: &Path) -> CalendarId {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .into()
}

/// Parse a calendar JSONL file with all of its events.
pub fn parse_calendar_file(path: &Path) -> Result<CalendarFile> {
    let id = calendar_id(path);

    let file =
        File::open(path).with_context(|| format!("Failed to open calendar file: {:?}", path))?;
    let reader = BufReader::new(file);

    let mut calendar: Option<Calendar> = None;
    let mut items: Vec<CalendarItem> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| "Failed to read line from calendar file")?;
        if line.trim().is_empty() {
            continue;
        }

        let calendar_line: CalendarLine = serde_json::from_str(&line).with_context(|| {
            format!(
                "Failed to parse calendar line {}: {}",
                number + 1,
                line.chars().take(100).collect::<String>()
            )
        })?;

        match calendar_line {
            CalendarLine::Calendar(header) => {
                if calendar.is_some() {
                    anyhow::bail!("Calendar file {:?} has more than one calendar line", path);
                }
                calendar = Some(Calendar::new(id.clone(), header.title));
            }
            CalendarLine::Event(event) => {
                if calendar.is_none() {
                    anyhow::bail!("First line of calendar file {:?} is not a calendar line", path);
                }
                if event.end < event.start {
                    anyhow::bail!(
                        "Event {} in {:?} ends before it starts (line {})",
                        event.id,
                        path,
                        number + 1
                    );
                }
                items.push(CalendarItem {
                    id: event.id,
                    calendar_id: id.clone(),
                    title: event.title,
                    start: event.start,
                    end: event.end,
                    all_day: event.all_day,
                });
            }
        }
    }

    let calendar = calendar.with_context(|| format!("Calendar file {:?} is empty", path))?;

    Ok(CalendarFile { calendar, items })
}

/// Parse only the header line, for fast listing. Leading blank lines are
/// skipped as in [`parse_calendar_file`].
pub fn parse_calendar_header(path: &Path) -> Result<Calendar> {
    let file =
        File::open(path).with_context(|| format!("Failed to open calendar file: {:?}", path))?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line.with_context(|| "Failed to read line from calendar file")?;
        if line.trim().is_empty() {
            continue;
        }

        let header: CalendarLine = serde_json::from_str(line.trim())
            .with_context(|| "Failed to parse first line as calendar")?;

        return match header {
            CalendarLine::Calendar(header) => Ok(Calendar::new(calendar_id(path), header.title)),
            CalendarLine::Event(_) => {
                anyhow::bail!("First line of calendar file {:?} is not a calendar line", path)
            }
        };
    }

    anyhow::bail!("Calendar file {:?} is empty", path)
}
