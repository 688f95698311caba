//! # overview-logging
//!
//! Logging for the overview calendar summaries.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured event logging
//! - [`SummaryEvent`] - Summarization lifecycle events
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)

mod events;

pub use events::{LogFormat, Logger, SummaryEvent};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
