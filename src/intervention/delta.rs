//! Delta Extractor — what did the writer add since the last evaluated snapshot?
//!
//! This is a best-effort heuristic, not a minimal diff. A plain append yields
//! the exact suffix; any other edit falls back to the tail of the document.

use regex::Regex;
use std::sync::LazyLock;

/// Words kept by the fallback when the text was edited rather than appended.
pub const FALLBACK_WORDS: usize = 100;

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|blockquote|h[1-6])\s*>").expect("valid block regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Reduce editor markup to plain text.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let with_breaks = BLOCK_BREAK.replace_all(text, "\n");
    let plain = ANY_TAG.replace_all(&with_breaks, "");
    plain
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Word count of the plain-text form of `text`.
pub fn word_count(text: &str) -> usize {
    strip_markup(text).split_whitespace().count()
}

/// Text judged to be newly written in `current` relative to `previous`.
pub fn extract_addition(previous: &str, current: &str) -> String {
    let previous = strip_markup(previous);
    let current = strip_markup(current);

    if current.len() <= previous.len() {
        return String::new();
    }

    if let Some(suffix) = current.strip_prefix(previous.as_str()) {
        return suffix.trim().to_string();
    }

    last_words(&current, FALLBACK_WORDS)
}

fn last_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}
