//! Small helpers shared across pipeline stages.

/// Truncate a string to at most `max_chars` Unicode scalar values, never
/// splitting a multi-byte character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_unicode_boundaries() {
        let s = "Café du Monde";
        let truncated = truncate_chars(s, 4);
        assert_eq!(truncated, "Café");
    }

    #[test]
    fn truncate_chars_no_op_when_shorter_than_limit() {
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
