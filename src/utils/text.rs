//! Text processing utilities.

/// Truncate a string to at most `max_chars` characters.
///
/// The result is always a prefix of the input and always lands on a UTF-8
/// character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_shorter_than_limit() {
        assert_eq!(truncate_chars("Aspirin", 100), "Aspirin");
    }

    #[test]
    fn test_truncate_at_limit() {
        assert_eq!(truncate_chars("Aspirin", 7), "Aspirin");
        assert_eq!(truncate_chars("Aspirin", 4), "Aspi");
    }

    #[test]
    fn test_truncate_is_prefix() {
        let text = "Acetylsalicylic acid; ASA; Aspirin";
        let truncated = truncate_chars(text, 10);
        assert!(text.starts_with(truncated));
        assert_eq!(truncated.chars().count(), 10);
    }

    #[test]
    fn test_truncate_multibyte() {
        // Counts characters, not bytes, and never splits a code point.
        assert_eq!(truncate_chars("βλεφαρίτις", 4), "βλεφ");
        assert_eq!(truncate_chars("", 5), "");
    }
}
