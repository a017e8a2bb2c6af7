use chrono::{TimeZone, Utc};

use crate::voting::{voting_finish_date, BLOCK_TIME_SECS};

#[test]
fn test_finish_date_adds_both_phases() {
    let start = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap();
    let finish = voting_finish_date(Some(start), 4320, 2160).unwrap();
    assert_eq!((finish - start).num_seconds(), 6480 * BLOCK_TIME_SECS);
}

#[test]
fn test_finish_date_needs_a_start() {
    assert_eq!(voting_finish_date(None, 100, 0), None);
}

#[test]
fn test_zero_durations_finish_at_start() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(voting_finish_date(Some(start), 0, 0), Some(start));
}

#[test]
fn test_overflow_yields_none() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(voting_finish_date(Some(start), u64::MAX, 1), None);
    assert_eq!(voting_finish_date(Some(start), u64::MAX / 2, 0), None);
}
