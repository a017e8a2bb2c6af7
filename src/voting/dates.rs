use chrono::{DateTime, Duration, Utc};

/// Average block interval of the chain, in seconds
pub const BLOCK_TIME_SECS: i64 = 20;

/// Deadline of a voting when the backend does not report one.
///
/// Both durations are block counts; the public voting phase extends the
/// deadline when present. Returns `None` without a start date or on overflow.
pub fn voting_finish_date(
    start_date: Option<DateTime<Utc>>,
    voting_duration: u64,
    public_voting_duration: u64,
) -> Option<DateTime<Utc>> {
    let start = start_date?;
    let blocks = voting_duration.checked_add(public_voting_duration)?;
    let seconds = i64::try_from(blocks).ok()?.checked_mul(BLOCK_TIME_SECS)?;
    start.checked_add_signed(Duration::try_seconds(seconds)?)
}
