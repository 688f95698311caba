mod commands;
mod config;
mod render;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use overview_logging::{init_tracing, LogFormat, Logger};

use crate::commands::SummaryArgs;
use crate::config::{Overrides, ProjectConfig, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "overview",
    about = "Summarize calendar events by year, month, day and title",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Working directory holding overview.toml (default: current directory)
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Directory of calendar JSONL files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// IANA time zone for calendar arithmetic, e.g. Europe/London
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Tracing filter level, e.g. debug
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available calendars
    Calendars {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the selectable years
    Years {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a year of one or more calendars
    Summary(SummaryArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = ProjectConfig::load(&working_dir)?.unwrap_or_default();
    let settings = Settings::resolve(
        Overrides {
            timezone: cli.timezone,
            data_dir: cli.data_dir,
            log_level: cli.log_level,
        },
        config,
    )?;

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&settings.log_level, log_format);
    tracing::debug!("Using calendars in {}", settings.data_dir.display());

    match cli.command {
        Commands::Calendars { json } => commands::handle_calendars(&settings, json),
        Commands::Years { json } => commands::handle_years(&settings, json),
        Commands::Summary(args) => {
            let logger = match settings.log_file {
                Some(ref path) => Logger::with_file(log_format, path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?,
                None => Logger::new(log_format),
            };

            let exit_code = commands::handle_summary(&settings, args, Arc::new(logger)).await?;
            std::process::exit(exit_code);
        }
    }
}
