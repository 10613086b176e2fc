//! SEO text limits.
//!
//! Limits are enforced when text is entered, by truncation. Nothing downstream
//! rejects longer values, so records loaded from the store keep whatever
//! length they were saved with.

/// Maximum length of an SEO title, in characters.
pub const SEO_TITLE_MAX: usize = 60;

/// Maximum length of an SEO description, in characters.
pub const SEO_DESCRIPTION_MAX: usize = 160;

/// Truncate `input` to at most `max` characters.
#[must_use]
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((byte_idx, _)) => input.get(..byte_idx).unwrap_or(input).to_string(),
        None => input.to_string(),
    }
}

/// Truncate an entered SEO title.
#[must_use]
pub fn seo_title(input: &str) -> String {
    truncate_chars(input, SEO_TITLE_MAX)
}

/// Truncate an entered SEO description.
#[must_use]
pub fn seo_description(input: &str) -> String {
    truncate_chars(input, SEO_DESCRIPTION_MAX)
}

/// Trim `input`, mapping empty results to `None`.
#[must_use]
pub fn trimmed_or_none(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        let title = "é".repeat(70);
        let truncated = seo_title(&title);
        assert_eq!(truncated.chars().count(), SEO_TITLE_MAX);
    }

    #[test]
    fn test_seo_limits() {
        assert_eq!(seo_title(&"a".repeat(61)).len(), 60);
        assert_eq!(seo_title(&"a".repeat(60)).len(), 60);
        assert_eq!(seo_description(&"b".repeat(200)).len(), 160);
        assert_eq!(seo_description("short"), "short");
    }

    #[test]
    fn test_trimmed_or_none() {
        assert_eq!(trimmed_or_none("  "), None);
        assert_eq!(trimmed_or_none(" x "), Some("x".to_string()));
    }
}
