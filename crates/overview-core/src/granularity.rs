use chrono::{DateTime, Days, Months, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// A calendar-relative step size.
///
/// Steps are resolved against the time zone of the instant being advanced,
/// so "1 month" from the 31st of January lands on the last day of February
/// and "1 day" across a DST change is 23 or 25 hours long.
///
/// The arithmetic is done on wall-clock time. A result repeated by a
/// backward transition takes the earlier instant; a result skipped by a
/// forward transition moves to the first instant after the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unit", content = "count", rename_all = "snake_case")]
pub enum Granularity {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

impl Granularity {
    pub fn day() -> Self {
        Self::Days(1)
    }

    pub fn week() -> Self {
        Self::Weeks(1)
    }

    pub fn month() -> Self {
        Self::Months(1)
    }

    pub fn year() -> Self {
        Self::Years(1)
    }

    /// Number of units in one step.
    pub fn count(&self) -> u32 {
        match self {
            Self::Days(n) | Self::Weeks(n) | Self::Months(n) | Self::Years(n) => *n,
        }
    }

    /// Reject steps that can never advance.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.count() == 0 {
            return Err(CalendarError::InvalidGranularity(format!(
                "step must be positive, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Advance `instant` by one step.
    ///
    /// Returns `None` only when the target is out of range.
    pub fn advance<Tz: TimeZone>(&self, instant: DateTime<Tz>) -> Option<DateTime<Tz>> {
        let local = self.advance_local(instant.naive_local())?;
        resolve_local(&instant.timezone(), local)
    }

    /// Advance a wall-clock time by one step, ignoring time zones.
    pub fn advance_local(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Self::Days(n) => local.checked_add_days(Days::new(u64::from(n))),
            Self::Weeks(n) => local.checked_add_days(Days::new(u64::from(n) * 7)),
            Self::Months(n) => local.checked_add_months(Months::new(n)),
            Self::Years(n) => local.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    fn unit_name(&self) -> &'static str {
        match self {
            Self::Days(_) => "day",
            Self::Weeks(_) => "week",
            Self::Months(_) => "month",
            Self::Years(_) => "year",
        }
    }
}

/// Longest forward transition searched when resolving a skipped time.
/// Samoa skipped a whole day in 2011.
const MAX_GAP_MINUTES: u32 = 48 * 60;

/// Pin a wall-clock time to an instant in `tz`.
///
/// Ambiguous times take the earlier instant. Times inside a gap resolve to
/// the first instant after it. `None` when nothing valid is in range.
pub(crate) fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    if let Some(instant) = tz.from_local_datetime(&local).earliest() {
        return Some(instant);
    }

    // Transitions fall on whole minutes.
    let mut probe = local.with_second(0)?.with_nanosecond(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        probe = probe.checked_add_signed(TimeDelta::minutes(1))?;
        if let Some(instant) = tz.from_local_datetime(&probe).earliest() {
            tracing::trace!("{} is skipped by a time zone transition; using {}", local, probe);
            return Some(instant);
        }
    }
    None
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n = self.count();
        if n == 1 {
            write!(f, "1 {}", self.unit_name())
        } else {
            write!(f, "{} {}s", n, self.unit_name())
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = CalendarError;

    /// Accepts `day`, `days`, `1 day`, `2 weeks`, `3 months`, `year`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let mut parts = normalized.split_whitespace();
        let (count, unit) = match (parts.next(), parts.next(), parts.next()) {
            (Some(unit), None, None) => (1, unit),
            (Some(count), Some(unit), None) => {
                let count = count.parse::<u32>().map_err(|_| {
                    CalendarError::InvalidGranularity(format!("invalid step count in '{}'", s))
                })?;
                (count, unit)
            }
            _ => {
                return Err(CalendarError::InvalidGranularity(format!(
                    "expected '<count> <unit>', got '{}'",
                    s
                )))
            }
        };

        let granularity = match unit.trim_end_matches('s') {
            "day" => Granularity::Days(count),
            "week" => Granularity::Weeks(count),
            "month" => Granularity::Months(count),
            "year" => Granularity::Years(count),
            _ => {
                return Err(CalendarError::InvalidGranularity(format!(
                    "unknown unit '{}'",
                    unit
                )))
            }
        };
        granularity.validate()?;
        Ok(granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_parse_granularity() {
        assert_eq!("day".parse::<Granularity>().unwrap(), Granularity::Days(1));
        assert_eq!("Days".parse::<Granularity>().unwrap(), Granularity::Days(1));
        assert_eq!("2 weeks".parse::<Granularity>().unwrap(), Granularity::Weeks(2));
        assert_eq!("1 month".parse::<Granularity>().unwrap(), Granularity::Months(1));
        assert_eq!(" 3 Years ".parse::<Granularity>().unwrap(), Granularity::Years(3));
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!(matches!(
            "0 days".parse::<Granularity>(),
            Err(CalendarError::InvalidGranularity(_))
        ));
        assert!("fortnight".parse::<Granularity>().is_err());
        assert!("-1 day".parse::<Granularity>().is_err());
        assert!("1 big month".parse::<Granularity>().is_err());
        assert!("".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for g in [Granularity::day(), Granularity::Weeks(2), Granularity::Months(3)] {
            assert_eq!(g.to_string().parse::<Granularity>().unwrap(), g);
        }
        assert_eq!(Granularity::Days(2).to_string(), "2 days");
        assert_eq!(Granularity::year().to_string(), "1 year");
    }

    #[test]
    fn test_advance_month_clamps_to_month_end() {
        let jan31 = Utc.with_ymd_and_hms(2021, 1, 31, 0, 0, 0).unwrap();
        let next = Granularity::month().advance(jan31).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2021, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_advance_week_and_year() {
        let start = Utc.with_ymd_and_hms(2020, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(
            Granularity::week().advance(start).unwrap(),
            Utc.with_ymd_and_hms(2020, 3, 7, 0, 0, 0).unwrap()
        );
        assert_eq!(
            Granularity::year().advance(start).unwrap(),
            Utc.with_ymd_and_hms(2021, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_advance_through_ambiguous_midnight_takes_earlier_instant() {
        // Havana falls back from 01:00 CDT to 00:00 CST on 2021-11-07
        let havana = chrono_tz::America::Havana;
        let start = havana.with_ymd_and_hms(2021, 11, 6, 0, 0, 0).unwrap();
        let next = Granularity::day().advance(start).unwrap();
        assert_eq!(next.to_rfc3339(), "2021-11-07T00:00:00-04:00");
    }

    #[test]
    fn test_advance_into_gap_moves_past_transition() {
        // Santiago skips 2021-09-05 00:00..01:00
        let santiago = chrono_tz::America::Santiago;
        let start = santiago.with_ymd_and_hms(2021, 9, 4, 0, 0, 0).unwrap();
        let next = Granularity::day().advance(start).unwrap();
        assert_eq!(next.to_rfc3339(), "2021-09-05T01:00:00-03:00");
    }

    #[test]
    fn test_resolve_local_inside_gap_uses_gap_end() {
        let london = chrono_tz::Europe::London;
        let skipped = NaiveDate::from_ymd_opt(2021, 3, 28)
            .unwrap()
            .and_hms_opt(1, 30, 45)
            .unwrap();
        let resolved = resolve_local(&london, skipped).unwrap();
        assert_eq!(resolved.to_rfc3339(), "2021-03-28T02:00:00+01:00");
    }

    #[test]
    fn test_advance_out_of_range_is_none() {
        assert!(Granularity::Years(u32::MAX).advance(Utc::now()).is_none());
    }
}
