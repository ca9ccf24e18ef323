/// Truncates `value` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Trims and truncates a remote response body for inclusion in an error message.
pub fn truncate_for_error(value: &str, max_chars: usize) -> String {
    truncate_chars(value.trim(), max_chars)
}
