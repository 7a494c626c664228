//! Frontmatter removal.
//!
//! A document may open with a YAML header fenced by `---` lines. The header is
//! dropped before rendering; anything that doesn't open with a matched pair of
//! fences passes through byte for byte.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// One fence line, optionally followed by a run of blank lines.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^---\r?\n(\s*\r?\n)?").expect("frontmatter pattern is valid")
});

/// Returns `content` with a leading frontmatter block removed.
///
/// The block must start at offset 0. Everything up to the end of the second
/// fence (including trailing blank lines the fence pattern absorbs) is cut.
pub fn strip(content: &[u8]) -> &[u8] {
    match boundaries(content) {
        Some((0, end)) => &content[end..],
        _ => content,
    }
}

/// Convenience wrapper for text bodies. Fences are ASCII, so the cut always
/// lands on a char boundary.
pub fn strip_str(content: &str) -> &str {
    let stripped = strip(content.as_bytes());
    &content[content.len() - stripped.len()..]
}

fn boundaries(content: &[u8]) -> Option<(usize, usize)> {
    let mut fences = FENCE.find_iter(content);
    let first = fences.next()?;
    let second = fences.next()?;
    Some((first.start(), second.end()))
}
