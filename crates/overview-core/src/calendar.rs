use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::CalendarError;
use crate::granularity::{resolve_local, Granularity};
use crate::interval::{self, DateInterval, Intervals};

/// Calendar arithmetic anchored in one time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarContext {
    tz: Tz,
}

impl Default for CalendarContext {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarContext {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: chrono_tz::UTC }
    }

    /// Resolve an IANA zone name such as `Europe/London`.
    pub fn from_name(name: &str) -> Result<Self, CalendarError> {
        let tz = name
            .parse::<Tz>()
            .map_err(|e| CalendarError::InvalidTimeZone(format!("{}: {}", name, e)))?;
        Ok(Self { tz })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The first instant of the given day: local midnight, or the end of
    /// the gap when a transition skips midnight.
    pub fn date(&self, year: i32, month: u32, day: u32) -> Result<DateTime<Tz>, CalendarError> {
        let midnight = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(CalendarError::InvalidDate)?
            .and_time(NaiveTime::MIN);
        resolve_local(&self.tz, midnight).ok_or(CalendarError::InvalidDate)
    }

    /// The interval starting at `start` and lasting one `duration` step.
    pub fn interval(
        &self,
        start: DateTime<Tz>,
        duration: Granularity,
    ) -> Result<DateInterval, CalendarError> {
        duration.validate()?;
        let end = duration.advance(start).ok_or(CalendarError::InvalidDate)?;
        DateInterval::new(start, end)
    }

    pub fn year_interval(&self, year: i32) -> Result<DateInterval, CalendarError> {
        self.interval(self.date(year, 1, 1)?, Granularity::year())
    }

    pub fn month_interval(&self, year: i32, month: u32) -> Result<DateInterval, CalendarError> {
        self.interval(self.date(year, month, 1)?, Granularity::month())
    }

    /// Selectable years, oldest first.
    pub fn years(&self, first: i32, last: i32) -> Vec<i32> {
        (first..=last).collect()
    }

    /// The current year in this calendar's time zone.
    pub fn current_year(&self) -> i32 {
        use chrono::Datelike;
        Utc::now().with_timezone(&self.tz).year()
    }

    /// Convert an instant into this calendar's time zone.
    pub fn local<T: TimeZone>(&self, instant: &DateTime<T>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    pub fn enumerate(
        &self,
        interval: &DateInterval,
        step: Granularity,
    ) -> Result<Intervals, CalendarError> {
        interval::enumerate(interval, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        let context = CalendarContext::from_name("Europe/London").unwrap();
        assert_eq!(context.tz(), chrono_tz::Europe::London);
        assert!(matches!(
            CalendarContext::from_name("Mars/Olympus_Mons"),
            Err(CalendarError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_year_interval_in_zone() {
        let context = CalendarContext::new(chrono_tz::America::New_York);
        let year = context.year_interval(2021).unwrap();
        assert_eq!(year.start().to_rfc3339(), "2021-01-01T00:00:00-05:00");
        assert_eq!(year.end().to_rfc3339(), "2022-01-01T00:00:00-05:00");
    }

    #[test]
    fn test_month_interval_handles_leap_years() {
        let context = CalendarContext::utc();
        let feb = context.month_interval(2020, 2).unwrap();
        assert_eq!(feb.duration().num_days(), 29);
    }

    #[test]
    fn test_invalid_anchor_is_invalid_date() {
        let context = CalendarContext::utc();
        assert_eq!(context.date(2021, 2, 30), Err(CalendarError::InvalidDate));
        assert_eq!(context.month_interval(2021, 13), Err(CalendarError::InvalidDate));
    }

    #[test]
    fn test_date_on_skipped_midnight_starts_after_gap() {
        let santiago = CalendarContext::new(chrono_tz::America::Santiago);
        let day = santiago.date(2021, 9, 5).unwrap();
        assert_eq!(day.to_rfc3339(), "2021-09-05T01:00:00-03:00");

        let havana = CalendarContext::new(chrono_tz::America::Havana);
        let repeated = havana.date(2021, 11, 7).unwrap();
        assert_eq!(repeated.to_rfc3339(), "2021-11-07T00:00:00-04:00");
    }

    #[test]
    fn test_years_range() {
        let context = CalendarContext::utc();
        assert_eq!(context.years(2019, 2021), vec![2019, 2020, 2021]);
        assert!(context.years(2022, 2021).is_empty());
    }
}
