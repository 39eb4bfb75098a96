//! Label text normalization
//!
//! draw.io stores labels of `html=1` shapes as HTML fragments. This turns
//! such a fragment into plain text lines, and plain text back into a
//! fragment.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</div\s*>|</p\s*>").expect("line break regex must compile")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex must compile"));

/// Split a label into trimmed, non-empty plain-text lines
pub fn label_lines(label: &str) -> Vec<String> {
    let with_breaks = LINE_BREAK.replace_all(label, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let text = htmlize::unescape(stripped.as_ref()).replace('\u{a0}', " ");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First line of a label, empty when the label has no text
pub fn label_title(label: &str) -> String {
    label_lines(label).into_iter().next().unwrap_or_default()
}

/// Plain text as the label of an `html=1` shape
pub fn html_label(text: &str) -> Cow<'_, str> {
    htmlize::escape_text(text)
}
