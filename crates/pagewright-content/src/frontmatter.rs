//! Front matter extraction.

/// Fence pairs accepted around a front matter block: (open, close).
const FENCES: &[(&str, &str)] = &[("---", "---"), ("<!--", "-->"), ("+++", "+++")];

/// A content file split into its front matter block and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Raw front matter text, without fences
    pub frontmatter: Option<&'a str>,

    /// Remaining body text
    pub body: &'a str,
}

/// Split raw content into an optional front matter block and a body.
///
/// The first non-blank line must be exactly an opening fence (`---`, `<!--` or
/// `+++`) and the block runs until a line that is exactly the matching closing
/// fence (`---`, `-->` or `+++`). When no fence pair matches, the whole input
/// is the body and no front matter is reported.
pub fn split_frontmatter(source: &str) -> Split<'_> {
    let unfenced = Split {
        frontmatter: None,
        body: source,
    };

    let trimmed = source.trim_start();
    let (first, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));

    let Some(close) = FENCES
        .iter()
        .find(|(open, _)| first.trim() == *open)
        .map(|(_, close)| *close)
    else {
        return unfenced;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == close {
            return Split {
                frontmatter: Some(rest[..offset].trim()),
                body: rest[offset + line.len()..].trim(),
            };
        }
        offset += line.len();
    }

    unfenced
}
