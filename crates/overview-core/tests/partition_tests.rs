use chrono::{DateTime, Datelike, TimeZone};
use chrono_tz::{Europe, Tz, UTC};
use overview_core::{
    enumerate, CalendarContext, CalendarError, DateInterval, EndPolicy, Granularity,
};

fn utc(y: i32, m: u32, d: u32) -> DateTime<Tz> {
    UTC.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn collect(interval: &DateInterval, step: Granularity) -> Vec<DateInterval> {
    enumerate(interval, step)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// No gaps, no overlaps, first start and last end line up with the input.
fn assert_contiguous(interval: &DateInterval, parts: &[DateInterval]) {
    assert!(!parts.is_empty());
    assert_eq!(parts[0].start(), interval.start());
    for pair in parts.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
        assert!(pair[0].start() < pair[0].end());
    }
    assert!(parts.last().unwrap().end() >= interval.end());
}

// ============================================================
// Partition count and shape
// ============================================================

#[test]
fn test_year_by_month_yields_twelve_months() {
    let year = DateInterval::new(utc(2021, 1, 1), utc(2022, 1, 1)).unwrap();
    let months = collect(&year, Granularity::month());

    assert_eq!(months.len(), 12);
    for (k, month) in months.iter().enumerate() {
        assert_eq!(month.start().month() as usize, k + 1);
        assert_eq!(month.start().day(), 1);
    }
    assert_eq!(months[11].end(), utc(2022, 1, 1));
    assert_contiguous(&year, &months);
}

#[test]
fn test_month_by_day_is_contiguous() {
    let february = DateInterval::new(utc(2020, 2, 1), utc(2020, 3, 1)).unwrap();
    let days = collect(&february, Granularity::day());

    assert_eq!(days.len(), 29);
    assert_contiguous(&february, &days);
    assert_eq!(days.last().unwrap().end(), february.end());
}

#[test]
fn test_partition_from_mid_month_anchor() {
    let span = DateInterval::new(utc(2021, 1, 31), utc(2021, 5, 1)).unwrap();
    let months = collect(&span, Granularity::month());

    // Jan 31 -> Feb 28 -> Mar 28 -> Apr 28 -> (May 28, clipped to May 1)
    assert_eq!(months.len(), 4);
    assert_eq!(months[0].end(), utc(2021, 2, 28));
    assert_eq!(months[3].end(), utc(2021, 5, 1));
    assert_contiguous(&span, &months);
}

#[test]
fn test_multi_unit_step() {
    let year = DateInterval::new(utc(2021, 1, 1), utc(2022, 1, 1)).unwrap();
    let quarters = collect(&year, Granularity::Months(3));
    assert_eq!(quarters.len(), 4);
    assert_eq!(quarters[2].start(), utc(2021, 7, 1));
}

// ============================================================
// Edge cases
// ============================================================

#[test]
fn test_empty_interval_yields_nothing() {
    let instant = utc(2021, 6, 1);
    let empty = DateInterval::new(instant, instant).unwrap();
    assert_eq!(enumerate(&empty, Granularity::day()).unwrap().count(), 0);
}

#[test]
fn test_final_interval_clipped_by_default() {
    let span = DateInterval::new(utc(2021, 1, 1), utc(2021, 2, 15)).unwrap();
    let months = collect(&span, Granularity::month());

    assert_eq!(months.len(), 2);
    assert_eq!(months[1].start(), utc(2021, 2, 1));
    assert_eq!(months[1].end(), utc(2021, 2, 15));
}

#[test]
fn test_overshoot_policy_keeps_full_final_step() {
    let span = DateInterval::new(utc(2021, 1, 1), utc(2021, 2, 15)).unwrap();
    let months: Vec<_> = enumerate(&span, Granularity::month())
        .unwrap()
        .with_end_policy(EndPolicy::Overshoot)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(months.len(), 2);
    assert_eq!(months[1].end(), utc(2021, 3, 1));
    assert_contiguous(&span, &months);
}

#[test]
fn test_zero_step_is_caller_error() {
    let year = DateInterval::new(utc(2021, 1, 1), utc(2022, 1, 1)).unwrap();
    assert!(matches!(
        enumerate(&year, Granularity::Months(0)),
        Err(CalendarError::InvalidGranularity(_))
    ));
}

#[test]
fn test_unrepresentable_step_keeps_prior_boundaries() {
    // The second step lands past chrono's last representable year
    let span = DateInterval::new(utc(2021, 1, 1), utc(260000, 1, 1)).unwrap();
    let step = Granularity::Years(200_000);

    let results: Vec<_> = enumerate(&span, step).unwrap().collect();

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().unwrap();
    assert_eq!(first.start(), span.start());
    assert_eq!(first.end(), utc(202021, 1, 1));
    assert_eq!(results[1], Err(CalendarError::InvalidDate));
}

#[test]
fn test_boundary_in_gap_moves_to_gap_end_without_drift() {
    // 2021-03-28 01:30 does not exist in London (clocks jump 01:00 -> 02:00)
    let start = Europe::London.with_ymd_and_hms(2021, 3, 26, 1, 30, 0).unwrap();
    let end = Europe::London.with_ymd_and_hms(2021, 3, 31, 0, 0, 0).unwrap();
    let span = DateInterval::new(start, end).unwrap();

    let days = collect(&span, Granularity::day());

    assert_eq!(days.len(), 5);
    assert_eq!(days[2].start().to_rfc3339(), "2021-03-28T02:00:00+01:00");
    assert_eq!(days[3].start().to_rfc3339(), "2021-03-29T01:30:00+01:00");
    assert_eq!(days[1].duration().num_minutes(), 23 * 60 + 30);
    assert_contiguous(&span, &days);
}

#[test]
fn test_days_across_dst_follow_local_midnight() {
    let context = CalendarContext::new(Europe::London);
    let span = DateInterval::new(
        context.date(2021, 3, 27).unwrap(),
        context.date(2021, 3, 30).unwrap(),
    )
    .unwrap();
    let days = collect(&span, Granularity::day());

    assert_eq!(days.len(), 3);
    assert_eq!(days[0].duration().num_hours(), 24);
    assert_eq!(days[1].duration().num_hours(), 23);
    assert_eq!(days[2].duration().num_hours(), 24);
    assert_contiguous(&span, &days);
}

#[test]
fn test_enumeration_is_restartable() {
    let year = DateInterval::new(utc(2021, 1, 1), utc(2022, 1, 1)).unwrap();
    let first = collect(&year, Granularity::month());
    let second = collect(&year, Granularity::month());
    assert_eq!(first, second);
}
