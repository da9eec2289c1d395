//! Filename-safe title sanitization.

const MAX_TITLE_LEN: usize = 50;

/// Reduce a catalog title to a filename-safe string: ASCII alphanumerics,
/// spaces, hyphens, and underscores only, trimmed and capped at 50 characters.
/// Titles with nothing usable left fall back to `item_{ordinal}`.
pub fn sanitize_title(title: &str, ordinal: usize) -> String {
    let filtered: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe: String = filtered.trim().chars().take(MAX_TITLE_LEN).collect();
    if safe.is_empty() {
        format!("item_{}", ordinal)
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unsafe_characters() {
        assert_eq!(sanitize_title("Test/Film!", 1), "TestFilm");
        assert_eq!(sanitize_title("Spider-Man: No Way Home", 1), "Spider-Man No Way Home");
        assert_eq!(sanitize_title("under_score", 1), "under_score");
    }

    #[test]
    fn keeps_plain_titles() {
        assert_eq!(sanitize_title("The Matrix", 3), "The Matrix");
    }

    #[test]
    fn caps_length_at_fifty() {
        let long = "a".repeat(80);
        let safe = sanitize_title(&long, 1);
        assert_eq!(safe.len(), 50);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize_title("  padded  ", 1), "padded");
    }

    #[test]
    fn falls_back_for_unusable_titles() {
        assert_eq!(sanitize_title("", 7), "item_7");
        assert_eq!(sanitize_title("///!!!", 12), "item_12");
        // Non-ASCII titles filter down to nothing
        assert_eq!(sanitize_title("فيلم", 2), "item_2");
    }

    #[test]
    fn output_alphabet_is_restricted() {
        let safe = sanitize_title("Amélie (2001) — édition", 1);
        assert!(safe
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_')));
    }
}
