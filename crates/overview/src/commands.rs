use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;

use overview_core::{
    Calendar, CalendarError, CalendarId, CalendarItem, DateInterval, EventSource, Granularity,
    ItemCount, Summarizer,
};
use overview_logging::{Logger, SummaryEvent};
use overview_store::{CalendarStore, CalendarWatcher};

use crate::config::Settings;
use crate::render::print_state;
use crate::view::ViewState;

#[derive(Args, Debug, Default)]
pub struct SummaryArgs {
    /// Calendar id to summarize (repeatable; picker if omitted)
    #[arg(short, long = "calendar")]
    pub calendars: Vec<String>,

    /// Summarize every calendar
    #[arg(long, conflicts_with = "calendars")]
    pub all: bool,

    /// Year to summarize (default: current year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Outer bucket size, e.g. "1 month"
    #[arg(long)]
    pub top: Option<Granularity>,

    /// Inner bucket size, e.g. "1 day"
    #[arg(long)]
    pub leaf: Option<Granularity>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep running and re-summarize when calendar files change
    #[arg(short, long)]
    pub watch: bool,
}

/// Everything needed to rebuild one summary.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub calendars: Vec<CalendarId>,
    pub interval: DateInterval,
    pub top: Granularity,
    pub leaf: Granularity,
}

/// Event source decorator that reports each query to the logger.
pub struct LoggedSource<S> {
    inner: S,
    logger: Arc<Logger>,
}

impl<S> LoggedSource<S> {
    pub fn new(inner: S, logger: Arc<Logger>) -> Self {
        Self { inner, logger }
    }
}

impl<S: EventSource> EventSource for LoggedSource<S> {
    fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        self.inner.calendars()
    }

    fn calendar(&self, id: &CalendarId) -> Result<Option<Calendar>, CalendarError> {
        self.inner.calendar(id)
    }

    fn query_items(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        let items = self.inner.query_items(interval, calendars)?;
        self.logger.log(&SummaryEvent::SourceQueried {
            calendars: calendars.map_or(0, <[CalendarId]>::len),
            items: items.len(),
        });
        Ok(items)
    }
}

pub fn handle_calendars(settings: &Settings, json: bool) -> Result<()> {
    let store = CalendarStore::with_dir(settings.data_dir.clone());
    let calendars = store.list_calendars()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&calendars)?);
    } else if calendars.is_empty() {
        println!(
            "{}",
            format!("No calendars found in {}.", settings.data_dir.display()).dimmed()
        );
    } else {
        println!("{:<20} {}", "ID".dimmed(), "TITLE".dimmed());
        for calendar in &calendars {
            println!("{:<20} {}", calendar.id.to_string().bright_cyan(), calendar.title);
        }
    }

    Ok(())
}

pub fn handle_years(settings: &Settings, json: bool) -> Result<()> {
    let years = settings.years();

    if json {
        println!("{}", serde_json::to_string(&years)?);
    } else {
        let current = settings.context.current_year();
        for year in years {
            if year == current {
                println!("{}", year.to_string().bold());
            } else {
                println!("{}", year);
            }
        }
    }

    Ok(())
}

/// Run the summary command and return the process exit code.
pub async fn handle_summary(
    settings: &Settings,
    args: SummaryArgs,
    logger: Arc<Logger>,
) -> Result<i32> {
    let store = CalendarStore::with_dir(settings.data_dir.clone());
    let known = store.list_calendars()?;

    let calendars = resolve_calendars(&known, &args, &settings.calendars)?;
    let year = args
        .year
        .or(settings.year)
        .unwrap_or_else(|| settings.context.current_year());
    let request = SummaryRequest {
        calendars,
        interval: settings.context.year_interval(year)?,
        top: args.top.unwrap_or(settings.top),
        leaf: args.leaf.unwrap_or(settings.leaf),
    };
    let heading = heading(&known, &request.calendars, year);

    let summarizer = Arc::new(Summarizer::new(LoggedSource::new(store, logger.clone())));

    if !args.watch {
        let state = refresh(summarizer, request, logger).await?;
        present(&heading, &state, args.json)?;
        return Ok(state.exit_code());
    }

    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("Failed to create {}", settings.data_dir.display()))?;
    let watcher = CalendarWatcher::with_dir(settings.data_dir.clone())
        .context("Failed to start calendar watcher")?;
    let mut changes = watcher.subscribe();

    let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("Failed to set Ctrl+C handler")?;

    loop {
        if !args.json {
            print_state(&heading, &ViewState::Loading);
        }
        let state = refresh(summarizer.clone(), request.clone(), logger.clone()).await?;
        present(&heading, &state, args.json)?;
        let exit_code = state.exit_code();

        tokio::select! {
            _ = stop_rx.recv() => return Ok(exit_code),
            change = changes.recv() => match change {
                Ok(event) => {
                    logger.log(&SummaryEvent::DataChanged {
                        calendar: event.id().to_string(),
                    });
                    // A single save often produces several file events.
                    while changes.try_recv().is_ok() {}
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} calendar change(s)", skipped);
                }
                Err(RecvError::Closed) => return Ok(exit_code),
            },
        }
    }
}

/// Summarize on the blocking pool; the store reads files synchronously.
async fn refresh<S: EventSource + 'static>(
    summarizer: Arc<Summarizer<S>>,
    request: SummaryRequest,
    logger: Arc<Logger>,
) -> Result<ViewState> {
    tokio::task::spawn_blocking(move || run_summary(&summarizer, &request, &logger))
        .await
        .context("Summary task panicked")
}

pub fn run_summary<S: EventSource>(
    summarizer: &Summarizer<S>,
    request: &SummaryRequest,
    logger: &Logger,
) -> ViewState {
    logger.log(&SummaryEvent::SummaryStarted {
        calendars: request.calendars.iter().map(ToString::to_string).collect(),
        interval: request.interval.to_string(),
        levels: vec![request.top.to_string(), request.leaf.to_string()],
    });

    let started = Instant::now();
    let result = summarizer.summarize_selection(
        &request.calendars,
        &request.interval,
        request.top,
        request.leaf,
    );

    match &result {
        Ok(hierarchy) => logger.log(&SummaryEvent::SummaryCompleted {
            periods: hierarchy.len(),
            items: hierarchy.item_count(),
            duration_secs: started.elapsed().as_secs_f64(),
        }),
        Err(e) => logger.log(&SummaryEvent::SummaryFailed {
            error: e.to_string(),
        }),
    }

    ViewState::from_result(&request.calendars, result)
}

fn present(heading: &str, state: &ViewState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        print_state(heading, state);
    }
    Ok(())
}

fn heading(known: &[Calendar], selection: &[CalendarId], year: i32) -> String {
    let titles: Vec<&str> = selection
        .iter()
        .map(|id| {
            known
                .iter()
                .find(|c| &c.id == id)
                .map_or(id.as_str(), |c| c.title.as_str())
        })
        .collect();
    format!("{} · {}", titles.join(", "), year)
}

/// Priority: --all > --calendar > config > interactive picker.
///
/// Without a terminal the picker is skipped and the selection stays empty.
fn resolve_calendars(
    known: &[Calendar],
    args: &SummaryArgs,
    configured: &[CalendarId],
) -> Result<Vec<CalendarId>> {
    if args.all {
        return Ok(known.iter().map(|c| c.id.clone()).collect());
    }
    if !args.calendars.is_empty() {
        return Ok(args
            .calendars
            .iter()
            .map(|id| CalendarId::from(id.as_str()))
            .collect());
    }
    if !configured.is_empty() {
        return Ok(configured.to_vec());
    }
    if !std::io::stdin().is_terminal() || args.json {
        return Ok(Vec::new());
    }
    if known.is_empty() {
        anyhow::bail!("No calendars found.");
    }

    let items: Vec<String> = known
        .iter()
        .map(|c| format!("{} ({})", c.title, c.id))
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a calendar")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(vec![known[selection].id.clone()])
}
