//! Text normalization shared by capture and matching.

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` Unicode scalar values.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Normalized text cut to `max_chars`, without a dangling trailing space.
pub fn text_sample(raw: &str, max_chars: usize) -> String {
    truncate_chars(&normalize_text(raw), max_chars)
        .trim_end()
        .to_string()
}

/// Drop punctuation and symbols, then normalize whitespace again.
pub fn strip_punctuation(value: &str) -> String {
    let kept: String = value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    normalize_text(&kept)
}
