use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for a summarization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SummaryEvent {
    SummaryStarted {
        calendars: Vec<String>,
        interval: String,
        levels: Vec<String>,
    },
    SourceQueried {
        calendars: usize,
        items: usize,
    },
    SummaryCompleted {
        periods: usize,
        items: usize,
        duration_secs: f64,
    },
    SummaryFailed {
        error: String,
    },
    DataChanged {
        calendar: String,
    },
}

impl SummaryEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for summary events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &SummaryEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        let line = match self.format {
            LogFormat::Json => serde_json::to_string(event).ok(),
            LogFormat::Pretty => Some(Self::pretty_line(event)),
            LogFormat::Compact => Some(Self::compact_line(event)),
        };
        if let Some(line) = line {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    fn pretty_line(event: &SummaryEvent) -> String {
        match event {
            SummaryEvent::SummaryStarted {
                calendars,
                interval,
                levels,
            } => format!(
                "{} {} {} {}",
                "▶".bright_cyan(),
                "Summarizing".bright_cyan().bold(),
                calendars.join(", "),
                format!("{} by {}", interval, levels.join(" / ")).dimmed()
            ),
            SummaryEvent::SourceQueried { calendars, items } => format!(
                "  {} {} {} from {} {}",
                "·".dimmed(),
                items,
                if *items == 1 { "item" } else { "items" },
                calendars,
                if *calendars == 1 {
                    "calendar"
                } else {
                    "calendars"
                }
            ),
            SummaryEvent::SummaryCompleted {
                periods,
                items,
                duration_secs,
            } => format!(
                "  {} {} periods, {} items ({:.2}s)",
                "✓".bright_green(),
                periods,
                items,
                duration_secs
            ),
            SummaryEvent::SummaryFailed { error } => {
                format!("{} {}", "✗".bright_red(), error.bright_red())
            }
            SummaryEvent::DataChanged { calendar } => format!(
                "{} {} changed, refreshing",
                "↻".bright_yellow(),
                calendar
            ),
        }
    }

    fn compact_line(event: &SummaryEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            SummaryEvent::SummaryStarted { calendars, interval, .. } => {
                format!("[{}] summary:start {} {}", timestamp, calendars.join(","), interval)
            }
            SummaryEvent::SourceQueried { calendars, items } => {
                format!("[{}] source:query {}c {}i", timestamp, calendars, items)
            }
            SummaryEvent::SummaryCompleted {
                periods,
                items,
                duration_secs,
            } => format!(
                "[{}] summary:done {}p {}i {:.2}s",
                timestamp, periods, items, duration_secs
            ),
            SummaryEvent::SummaryFailed { error } => {
                format!("[{}] summary:error {}", timestamp, error)
            }
            SummaryEvent::DataChanged { calendar } => {
                format!("[{}] data:changed {}", timestamp, calendar)
            }
        }
    }
}
