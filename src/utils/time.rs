use chrono::{DateTime, Duration, Utc};

/// Returns the current time in UTC
pub fn current_time() -> DateTime<Utc> {
    Utc::now()
}

/// Time left until `deadline`, zero once it has passed
pub fn time_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let left = deadline.signed_duration_since(now);
    if left < Duration::zero() {
        Duration::zero()
    } else {
        left
    }
}

/// Format the time left until a deadline in a human-readable format
pub fn format_time_left(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(deadline) = deadline else {
        return String::from("not started");
    };
    let left = time_until(deadline, now).num_seconds();

    if left == 0 {
        String::from("finished")
    } else if left < 60 {
        format!("{} seconds left", left)
    } else if left < 3600 {
        format!("{} minutes left", left / 60)
    } else if left < 86400 {
        format!("{} hours left", left / 3600)
    } else {
        format!("{} days left", left / 86400)
    }
}
