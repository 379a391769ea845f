use chrono::Utc;

/// Current wall-clock time as unix milliseconds.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Milliseconds elapsed since `start`, never negative.
pub fn elapsed_millis(start: i64) -> i64 {
    (time_millis() - start).max(0)
}
