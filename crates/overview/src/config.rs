//! Project configuration file support for overview.
//!
//! Loads configuration from `overview.toml` in the working directory.

use anyhow::{Context, Result};
use overview_core::{CalendarContext, CalendarId, Granularity};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project-level configuration loaded from `overview.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// IANA time zone used for calendar arithmetic (default: UTC)
    pub timezone: Option<String>,
    /// Directory holding the calendar JSONL files
    pub data_dir: Option<PathBuf>,
    /// Oldest year offered by the year list
    pub first_year: Option<i32>,
    /// Year summarized when none is given on the command line
    pub year: Option<i32>,
    /// Calendars summarized when none are given on the command line
    #[serde(default)]
    pub calendars: Vec<String>,
    /// Outer bucket size, e.g. "1 month"
    pub top_granularity: Option<String>,
    /// Inner bucket size, e.g. "1 day"
    pub leaf_granularity: Option<String>,
    /// Tracing filter level (default: warn)
    pub log_level: Option<String>,
    /// Append summary events as JSON lines to this file
    pub log_file: Option<PathBuf>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "overview.toml";

/// How many years back the year list reaches without `first_year`
const DEFAULT_YEAR_SPAN: i32 = 10;

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

/// Command-line values that take priority over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub timezone: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug)]
pub struct Settings {
    pub context: CalendarContext,
    pub data_dir: PathBuf,
    pub first_year: i32,
    pub year: Option<i32>,
    pub calendars: Vec<CalendarId>,
    pub top: Granularity,
    pub leaf: Granularity,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Priority: flag > config file > default
    pub fn resolve(overrides: Overrides, config: ProjectConfig) -> Result<Self> {
        let context = match overrides.timezone.or(config.timezone) {
            Some(name) => CalendarContext::from_name(&name)?,
            None => CalendarContext::utc(),
        };

        let data_dir = match overrides.data_dir.or(config.data_dir) {
            Some(dir) => dir,
            None => overview_store::CalendarStore::default_dir()?,
        };

        let top = parse_granularity(config.top_granularity.as_deref(), Granularity::month())
            .context("Invalid top_granularity")?;
        let leaf = parse_granularity(config.leaf_granularity.as_deref(), Granularity::day())
            .context("Invalid leaf_granularity")?;

        let first_year = config
            .first_year
            .unwrap_or_else(|| context.current_year() - DEFAULT_YEAR_SPAN);

        Ok(Self {
            context,
            data_dir,
            first_year,
            year: config.year,
            calendars: config.calendars.into_iter().map(CalendarId::from).collect(),
            top,
            leaf,
            log_level: overrides
                .log_level
                .or(config.log_level)
                .unwrap_or_else(|| "warn".to_string()),
            log_file: config.log_file,
        })
    }

    /// Years offered for selection, oldest first.
    pub fn years(&self) -> Vec<i32> {
        self.context.years(self.first_year, self.context.current_year())
    }
}

fn parse_granularity(value: Option<&str>, default: Granularity) -> Result<Granularity> {
    match value {
        Some(value) => Ok(value.parse::<Granularity>()?),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
timezone = "Europe/London"
data_dir = "/tmp/calendars"
first_year = 2018
year = 2021
calendars = ["work", "home"]
top_granularity = "1 month"
leaf_granularity = "1 week"
log_level = "debug"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        let settings = Settings::resolve(Overrides::default(), config).unwrap();

        assert_eq!(settings.context.tz(), chrono_tz::Europe::London);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/calendars"));
        assert_eq!(settings.first_year, 2018);
        assert_eq!(settings.year, Some(2021));
        assert_eq!(
            settings.calendars,
            vec![CalendarId::from("work"), CalendarId::from("home")]
        );
        assert_eq!(settings.leaf, Granularity::week());
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.years().first(), Some(&2018));
    }

    #[test]
    fn test_unknown_field_is_hard_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "colour = \"blue\"\n").unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_overrides_take_priority() {
        let config = ProjectConfig {
            timezone: Some("Europe/London".to_string()),
            data_dir: Some(PathBuf::from("/from/config")),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            timezone: Some("America/New_York".to_string()),
            data_dir: Some(PathBuf::from("/from/flag")),
            log_level: None,
        };

        let settings = Settings::resolve(overrides, config).unwrap();

        assert_eq!(settings.context.tz(), chrono_tz::America::New_York);
        assert_eq!(settings.data_dir, PathBuf::from("/from/flag"));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.top, Granularity::month());
        assert_eq!(settings.leaf, Granularity::day());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = ProjectConfig {
            data_dir: Some(PathBuf::from("/tmp")),
            leaf_granularity: Some("0 days".to_string()),
            ..Default::default()
        };
        assert!(Settings::resolve(Overrides::default(), config).is_err());

        let config = ProjectConfig {
            data_dir: Some(PathBuf::from("/tmp")),
            timezone: Some("Nowhere/Special".to_string()),
            ..Default::default()
        };
        assert!(Settings::resolve(Overrides::default(), config).is_err());
    }
}
