//! Small text helpers shared by the relay paths.

/// Truncate `text` to at most `max_len` characters, appending an ellipsis
/// when anything was cut.
///
/// Counts `char`s, not bytes, so multi-byte names are never split mid
/// code point.
#[must_use]
pub fn shorten_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
