//! Small string helpers used across the pipeline.

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended. Model responses and article bodies go through
/// this before landing in a log line.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…(+{} bytes)", &s[..end], s.len() - end)
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Article bodies scraped from markup-heavy pages arrive with stray
/// newlines and indentation; this normalizes them the way the sources
/// expect their content stored.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
