use std::collections::HashMap;

use crate::error::CalendarError;
use crate::granularity::Granularity;
use crate::interval::{enumerate, DateInterval};
use crate::source::{CalendarId, CalendarItem, EventSource};
use crate::summary::{PeriodSummary, Summary, SummaryNode, TitleSummary};

/// Month buckets of day buckets of title groups, for the default two
/// levels.
pub type Hierarchy = Vec<PeriodSummary<PeriodSummary<TitleSummary>>>;

/// Builds summary trees from an event source.
///
/// Every operation queries the source exactly once, over the whole
/// requested interval, and then attributes each item to the sub-interval
/// containing its start. Items that start before the requested interval
/// belong to its first sub-interval. No item is counted twice, however
/// many sub-intervals it spans.
pub struct Summarizer<S> {
    source: S,
}

impl<S: EventSource> Summarizer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Group every item in `interval` by title.
    pub fn titles(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<TitleSummary>, CalendarError> {
        let items = self.fetch(interval, calendars)?;
        Ok(group_by_title(interval, items))
    }

    /// One level: split `interval` at `granularity` and group each
    /// sub-interval by title. Sub-intervals without items are kept.
    pub fn summarize(
        &self,
        interval: &DateInterval,
        granularity: Granularity,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<PeriodSummary<TitleSummary>>, CalendarError> {
        granularity.validate()?;
        let items = self.fetch(interval, calendars)?;
        bucket(interval, granularity, items, |period, members| {
            Ok(group_by_title(period, members))
        })
    }

    /// Two levels for a single calendar: `top` buckets of `leaf` buckets
    /// of title groups.
    pub fn summarize_hierarchy(
        &self,
        calendar_id: &CalendarId,
        interval: &DateInterval,
        top: Granularity,
        leaf: Granularity,
    ) -> Result<Hierarchy, CalendarError> {
        self.summarize_selection(std::slice::from_ref(calendar_id), interval, top, leaf)
    }

    /// Like [`Self::summarize_hierarchy`] over several calendars at once.
    ///
    /// Every id is resolved before the source is queried. An empty
    /// selection summarizes nothing.
    pub fn summarize_selection(
        &self,
        calendar_ids: &[CalendarId],
        interval: &DateInterval,
        top: Granularity,
        leaf: Granularity,
    ) -> Result<Hierarchy, CalendarError> {
        self.resolve(calendar_ids)?;
        top.validate()?;
        leaf.validate()?;

        if calendar_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.fetch(interval, Some(calendar_ids))?;
        bucket(interval, top, items, |period, members| {
            bucket(period, leaf, members, |day, members| {
                Ok(group_by_title(day, members))
            })
        })
    }

    /// Any number of levels, outermost first. With no levels the result
    /// is the title groups of `interval`.
    pub fn summarize_levels(
        &self,
        interval: &DateInterval,
        levels: &[Granularity],
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<SummaryNode>, CalendarError> {
        for level in levels {
            level.validate()?;
        }
        let items = self.fetch(interval, calendars)?;
        nest(interval, levels, items)
    }

    fn resolve(&self, calendar_ids: &[CalendarId]) -> Result<(), CalendarError> {
        for id in calendar_ids {
            if self.source.calendar(id)?.is_none() {
                tracing::debug!("Calendar {} is not known to the event source", id);
                return Err(CalendarError::UnknownCalendar(id.clone()));
            }
        }
        Ok(())
    }

    fn fetch(
        &self,
        interval: &DateInterval,
        calendars: Option<&[CalendarId]>,
    ) -> Result<Vec<CalendarItem>, CalendarError> {
        let fetched = self.source.query_items(interval, calendars)?;
        let total = fetched.len();

        let items: Vec<CalendarItem> = fetched
            .into_iter()
            .filter(|item| item.intersects(interval))
            .collect();
        if items.len() != total {
            tracing::debug!(
                "Ignored {} item(s) outside {} returned by the event source",
                total - items.len(),
                interval
            );
        }

        tracing::debug!("Fetched {} item(s) for {}", items.len(), interval);
        Ok(items)
    }
}

/// Group items by title, in order of first appearance.
///
/// Items without a title share the [`crate::UNKNOWN_TITLE`] group. Members
/// keep their input order.
pub fn group_by_title(interval: &DateInterval, items: Vec<CalendarItem>) -> Vec<TitleSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<CalendarItem>)> = Vec::new();

    for item in items {
        let key = item.title_or_unknown();
        match index.get(key) {
            Some(&position) => groups[position].1.push(item),
            None => {
                let key = key.to_string();
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![item]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(title, members)| Summary::new(*interval, title, members))
        .collect()
}

/// Split `interval` at `step`, attribute each item to a sub-interval and
/// build one summary per sub-interval from `children`.
fn bucket<T, F>(
    interval: &DateInterval,
    step: Granularity,
    items: Vec<CalendarItem>,
    mut children: F,
) -> Result<Vec<PeriodSummary<T>>, CalendarError>
where
    F: FnMut(&DateInterval, Vec<CalendarItem>) -> Result<Vec<T>, CalendarError>,
{
    let periods = enumerate(interval, step)?.collect::<Result<Vec<_>, _>>()?;
    let mut members: Vec<Vec<CalendarItem>> = periods.iter().map(|_| Vec::new()).collect();

    for item in items {
        match classify(&periods, interval, &item) {
            Some(position) => members[position].push(item),
            None => tracing::warn!(
                "Item {} starting {} falls outside {}",
                item.id,
                item.start.to_rfc3339(),
                interval
            ),
        }
    }

    periods
        .into_iter()
        .zip(members)
        .map(|(period, members)| {
            let items = children(&period, members)?;
            Ok(Summary::new(period, step, items))
        })
        .collect()
}

/// Index of the period containing the item's start, clamped to the
/// interval start.
fn classify(
    periods: &[DateInterval],
    interval: &DateInterval,
    item: &CalendarItem,
) -> Option<usize> {
    let anchor = if interval.start() > item.start {
        interval.start()
    } else {
        item.start.with_timezone(&interval.start().timezone())
    };

    let position = periods.partition_point(|period| period.end() <= anchor);
    periods
        .get(position)
        .filter(|period| period.contains(&anchor))
        .map(|_| position)
}

fn nest(
    interval: &DateInterval,
    levels: &[Granularity],
    items: Vec<CalendarItem>,
) -> Result<Vec<SummaryNode>, CalendarError> {
    match levels.split_first() {
        None => Ok(group_by_title(interval, items)
            .into_iter()
            .map(SummaryNode::Group)
            .collect()),
        Some((step, rest)) => Ok(bucket(interval, *step, items, |period, members| {
            nest(period, rest, members)
        })?
        .into_iter()
        .map(SummaryNode::Period)
        .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;

    fn span(from: (u32, u32), to: (u32, u32)) -> DateInterval {
        DateInterval::new(
            UTC.with_ymd_and_hms(2021, from.0, from.1, 0, 0, 0).unwrap(),
            UTC.with_ymd_and_hms(2021, to.0, to.1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn item(id: &str, title: Option<&str>, day: u32) -> CalendarItem {
        let item = CalendarItem::new(
            id,
            "work",
            Utc.with_ymd_and_hms(2021, 3, day, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 3, day, 10, 0, 0).unwrap(),
        );
        match title {
            Some(title) => item.with_title(title),
            None => item,
        }
    }

    #[test]
    fn test_group_by_title_keeps_first_appearance_order() {
        let items = vec![
            item("1", Some("Standup"), 2),
            item("2", Some("Review"), 2),
            item("3", None, 3),
            item("4", Some("Standup"), 4),
        ];
        let groups = group_by_title(&span((3, 1), (4, 1)), items);

        let titles: Vec<&str> = groups.iter().map(|g| g.context.as_str()).collect();
        assert_eq!(titles, vec!["Standup", "Review", "Unknown"]);
        let standup: Vec<&str> = groups[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(standup, vec!["1", "4"]);
    }

    #[test]
    fn test_group_by_title_empty_input_has_no_groups() {
        assert!(group_by_title(&span((3, 1), (4, 1)), Vec::new()).is_empty());
    }

    #[test]
    fn test_classify_clamps_early_items_to_first_period() {
        let month = span((3, 1), (4, 1));
        let periods: Vec<DateInterval> = enumerate(&month, Granularity::day())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let early = CalendarItem::new(
            "x",
            "work",
            Utc.with_ymd_and_hms(2021, 2, 27, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 3, 2, 9, 0, 0).unwrap(),
        );
        assert_eq!(classify(&periods, &month, &early), Some(0));
        assert_eq!(classify(&periods, &month, &item("y", None, 31)), Some(30));
    }

    #[test]
    fn test_bucket_keeps_empty_periods() {
        let span = span((3, 1), (3, 4));
        let items = vec![item("1", None, 2)];
        let summaries = bucket(&span, Granularity::day(), items, |period, members| {
            Ok(group_by_title(period, members))
        })
        .unwrap();

        assert_eq!(summaries.len(), 3);
        assert!(summaries[0].is_empty());
        assert_eq!(summaries[1].len(), 1);
        assert!(summaries[2].is_empty());
    }
}
