//! Slug normalization for page identifiers and URLs.

/// Convert arbitrary path or title text to a URL-safe slug.
///
/// The result only contains `[a-z0-9/-]`: unicode is transliterated to ASCII,
/// every other character becomes a `-` separator, repeated separators collapse
/// and leading/trailing separators are stripped, both for the whole string and
/// for every `/`-delimited segment. Backslashes count as path separators.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();

    ascii
        .split(['/', '\\'])
        .map(slugify_segment)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn slugify_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
