use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::CalendarError;
use crate::granularity::{resolve_local, Granularity};

/// A half-open time range `[start, end)` anchored in a time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateInterval {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl DateInterval {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidInterval);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Start-inclusive, end-exclusive membership.
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        self.start <= *instant && self.end > *instant
    }

    /// True when `[start, end)` overlaps this interval. A zero-length range
    /// overlaps when its instant is contained.
    pub fn intersects<T: TimeZone>(&self, start: &DateTime<T>, end: &DateTime<T>) -> bool {
        if start == end {
            return self.contains(start);
        }
        self.end > *start && self.start < *end
    }
}

impl std::fmt::Display for DateInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// What to do with the last sub-interval when the final step lands past
/// the end of the enumerated range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndPolicy {
    /// Clip the last sub-interval to the range end.
    #[default]
    Clip,
    /// Keep the computed boundary even when it lies past the range end.
    Overshoot,
}

/// Partition `interval` into consecutive steps of `step`.
///
/// Fails up front only for a step that can never advance. Boundaries that
/// cannot be computed surface lazily from the iterator.
pub fn enumerate(interval: &DateInterval, step: Granularity) -> Result<Intervals, CalendarError> {
    step.validate()?;
    Ok(Intervals {
        cursor: Some((interval.start.naive_local(), interval.start)),
        end: interval.end,
        step,
        policy: EndPolicy::default(),
    })
}

/// Lazy sequence of contiguous, non-overlapping sub-intervals.
///
/// Boundaries step in wall-clock time from the range start, so a boundary
/// moved forward out of a DST gap does not shift the ones after it.
/// Yields every interval it can compute; if a boundary is out of range it
/// yields one `Err(InvalidDate)` and then stops.
#[derive(Debug, Clone)]
pub struct Intervals {
    cursor: Option<(NaiveDateTime, DateTime<Tz>)>,
    end: DateTime<Tz>,
    step: Granularity,
    policy: EndPolicy,
}

impl Intervals {
    pub fn with_end_policy(mut self, policy: EndPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn step(&self) -> Granularity {
        self.step
    }
}

impl Iterator for Intervals {
    type Item = Result<DateInterval, CalendarError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (wall, current) = self.cursor.take()?;
        if current >= self.end {
            return None;
        }

        let tz = current.timezone();
        let advanced = self.step.advance_local(wall).and_then(|next_wall| {
            let next = resolve_local(&tz, next_wall)?;
            (next > current).then_some((next_wall, next))
        });
        let Some((next_wall, next)) = advanced else {
            tracing::debug!(
                "Cannot advance {} by {}; stopping enumeration",
                current.to_rfc3339(),
                self.step
            );
            return Some(Err(CalendarError::InvalidDate));
        };

        let boundary = match self.policy {
            EndPolicy::Clip if next > self.end => self.end,
            _ => next,
        };
        tracing::trace!(
            "Enumerated [{}, {})",
            current.to_rfc3339(),
            boundary.to_rfc3339()
        );

        self.cursor = Some((next_wall, next));
        Some(Ok(DateInterval {
            start: current,
            end: boundary,
        }))
    }
}

impl std::iter::FusedIterator for Intervals {}
