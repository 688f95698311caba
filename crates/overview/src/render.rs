use colored::Colorize;
use overview_core::{DateInterval, Granularity, Hierarchy, ItemCount};

use crate::view::ViewState;

/// One row of the printed summary tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub depth: usize,
    pub label: String,
    pub count: usize,
}

/// Label for a period bucket, formatted in the bucket's own time zone.
pub fn period_label(interval: &DateInterval, step: Granularity) -> String {
    let start = interval.start();
    match step {
        Granularity::Years(1) => start.format("%Y").to_string(),
        Granularity::Months(1) => start.format("%B %Y").to_string(),
        Granularity::Days(1) => start.format("%a %-d %b").to_string(),
        Granularity::Weeks(1) => format!("Week of {}", start.format("%-d %b")),
        _ => format!(
            "{} – {}",
            start.format("%-d %b %Y"),
            interval.end().format("%-d %b %Y")
        ),
    }
}

/// Flatten a hierarchy into printable rows, skipping empty periods.
pub fn tree_lines(hierarchy: &Hierarchy) -> Vec<TreeLine> {
    let mut lines = Vec::new();
    for period in hierarchy.iter().filter(|p| p.item_count() > 0) {
        lines.push(TreeLine {
            depth: 0,
            label: period_label(&period.date_interval, period.context),
            count: period.item_count(),
        });
        for leaf in period.items.iter().filter(|l| l.item_count() > 0) {
            lines.push(TreeLine {
                depth: 1,
                label: period_label(&leaf.date_interval, leaf.context),
                count: leaf.item_count(),
            });
            for group in &leaf.items {
                lines.push(TreeLine {
                    depth: 2,
                    label: group.context.clone(),
                    count: group.len(),
                });
            }
        }
    }
    lines
}

pub fn print_state(heading: &str, state: &ViewState) {
    match state {
        ViewState::Loading => println!("{}", "Loading…".dimmed()),
        ViewState::NoCalendarsSelected => {
            println!("{}", "No Calendars Selected".bright_yellow().bold());
            println!(
                "{}",
                "Pass --calendar <ID> or --all, or set `calendars` in overview.toml.".dimmed()
            );
        }
        ViewState::Empty => {
            println!("{}", heading.bright_blue().bold());
            println!("{}", "No events.".dimmed());
        }
        ViewState::Ready(hierarchy) => {
            println!("{}", heading.bright_blue().bold());
            for line in tree_lines(hierarchy) {
                print_line(&line);
            }
        }
        ViewState::Failed(error) => {
            eprintln!("{} {}", "Error:".bright_red().bold(), error);
        }
    }
}

fn print_line(line: &TreeLine) {
    let indent = "  ".repeat(line.depth);
    match line.depth {
        0 => println!(
            "{}{} {}",
            indent,
            line.label.bold(),
            format!("({})", plural(line.count)).dimmed()
        ),
        1 => println!(
            "{}{} {}",
            indent,
            line.label.bright_cyan(),
            format!("({})", plural(line.count)).dimmed()
        ),
        _ => println!(
            "{}{} {}",
            indent,
            line.label,
            format!("×{}", line.count).dimmed()
        ),
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", count)
    }
}
