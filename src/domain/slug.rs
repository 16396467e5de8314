//! Human-readable slugs for customer and project links.

const FALLBACK: &str = "item";

/// Lowercase, whitespace runs to `-`, anything outside `[a-z0-9-]` dropped,
/// repeated `-` collapsed and trimmed from both ends. Empty results become
/// `"item"`.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut in_whitespace = false;
    for ch in s.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            slug.push(ch);
        }
    }

    let collapsed = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if collapsed.is_empty() {
        FALLBACK.to_string()
    } else {
        collapsed
    }
}

/// `"{slug}-{first 8 id chars without dashes}"`.
pub fn slug_with_id(s: &str, id: &str) -> String {
    let short_id: String = id.chars().filter(|c| *c != '-').take(8).collect();
    format!("{}-{}", slugify(s), short_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("PT Energi   Nusantara"), "pt-energi-nusantara");
    }

    #[test]
    fn slugify_collapses_dashes() {
        assert_eq!(slugify("a - b -- c"), "a-b-c");
        assert_eq!(slugify("-lead-"), "lead");
    }

    #[test]
    fn slugify_falls_back_for_empty() {
        assert_eq!(slugify("!!!"), "item");
        assert_eq!(slugify(""), "item");
        assert_eq!(slugify("日本"), "item");
    }

    #[test]
    fn slug_with_id_uses_short_id() {
        assert_eq!(
            slug_with_id("Data Center Jakarta", "3f2a9c1e-77b0-4d5e-9c1a-0e2b3c4d5e6f"),
            "data-center-jakarta-3f2a9c1e"
        );
        assert_eq!(slug_with_id("???", "ab-cd"), "item-abcd");
    }
}
