/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Returns true when `observed_unix` lies within `max_skew_seconds` of `now_unix`
/// in either direction.
pub fn is_within_skew(observed_unix: u64, now_unix: u64, max_skew_seconds: u64) -> bool {
    observed_unix.abs_diff(now_unix) <= max_skew_seconds
}
