//! URL slugs derived from category and tool names.
//!
//! The derivation is lossy: "Text-to-Speech" and "Text to Speech" share the
//! slug `text-to-speech`, so a slug is a routing hint, not a key.

/// Lowercase `name` and replace each run of whitespace with a single hyphen.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }

    slug
}

/// Recover the name a slug is matched against: every hyphen becomes a space.
#[must_use]
pub fn slug_to_name(slug: &str) -> String {
    slug.replace('-', " ")
}
