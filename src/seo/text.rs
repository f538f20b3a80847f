//! Text utilities for crawler-facing rendering
//!
//! Everything the renderer emits goes through `escape_html`; descriptions
//! come from `truncate_description` and reading time from
//! `reading_time_minutes`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Character budget for meta descriptions
pub const DESCRIPTION_MAX_LEN: usize = 160;

/// Reading speed used for the reading-time estimate
const WORDS_PER_MINUTE: usize = 200;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid regex"));

/// Escape the five HTML special characters (`&`, `<`, `>`, `"`, `'`).
///
/// Nothing else is altered.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strip HTML tags and markdown syntax, collapsing whitespace, so the
/// result is usable as plain text in meta descriptions.
pub fn strip_markup(text: &str) -> String {
    let text = TAG_RE.replace_all(text, " ");
    let text = LINK_RE.replace_all(&text, "$1");
    text.replace(['#', '*', '`', '~'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate text to at most `max_len` characters, sentence-boundary
/// aware.
///
/// When the text exceeds the budget, the cut prefers the last
/// sentence-ending character (`.`, `!`, `?`) found past the 50% mark of
/// the truncation window; otherwise it cuts at a word boundary and
/// appends an ellipsis. The result never exceeds `max_len` characters.
pub fn truncate_description(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let window: Vec<char> = text.chars().take(max_len).collect();
    let half = max_len / 2;

    // Prefer a sentence boundary in the second half of the window
    let mut sentence_cut = None;
    for (i, c) in window.iter().enumerate() {
        if matches!(c, '.' | '!' | '?') && i + 1 > half {
            sentence_cut = Some(i + 1);
        }
    }
    if let Some(cut) = sentence_cut {
        return window[..cut]
            .iter()
            .collect::<String>()
            .trim_end()
            .to_string();
    }

    // Otherwise cut at a word boundary, leaving room for the ellipsis
    let budget = max_len.saturating_sub(3);
    let mut cut = budget;
    for (i, c) in window.iter().enumerate().take(budget) {
        if c.is_whitespace() {
            cut = i;
        }
    }
    let prefix: String = window[..cut].iter().collect();
    format!("{}...", prefix.trim_end())
}

/// Estimate reading time in minutes at 200 words per minute.
///
/// Always at least one minute for non-empty content.
pub fn reading_time_minutes(content: &str) -> usize {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Build the keyword list for a page: the site-wide set plus the entity's
/// category names.
pub fn keywords(category_names: &[String]) -> String {
    let mut all: Vec<String> = [
        "finance",
        "accounting",
        "bookkeeping",
        "tax",
        "audit",
        "community",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for name in category_names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !all.contains(&name) {
            all.push(name);
        }
    }

    all.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_html_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_escape_html_leaves_other_characters() {
        let text = "Plain text with üñïçødé, digits 123 and punctuation:;!?";
        assert_eq!(escape_html(text), text);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("# Title\n\nSome **bold** and a [link](https://x.com)."),
            "Title Some bold and a link."
        );
        assert_eq!(strip_markup("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_description("Short text.", 160), "Short text.");
    }

    #[test]
    fn test_truncate_prefers_sentence_boundary() {
        // The period sits past the midpoint of the window
        let text = "First sentence ends here. Second sentence keeps going with more and more words.";
        let result = truncate_description(text, 40);
        assert_eq!(result, "First sentence ends here.");
    }

    #[test]
    fn test_truncate_ignores_early_sentence_boundary() {
        // Period before the midpoint is not a preferred cut
        let text = "Hi. Then a very long run of words without any further punctuation at all in sight";
        let result = truncate_description(text, 40);
        assert!(result.ends_with("..."));
        assert!(result.chars().count() <= 40);
    }

    #[test]
    fn test_reading_time_floor() {
        assert_eq!(reading_time_minutes("one two three"), 1);
        let long = "word ".repeat(450);
        assert_eq!(reading_time_minutes(&long), 3);
    }

    #[test]
    fn test_keywords_include_categories() {
        let kw = keywords(&["Markets".to_string(), "Tax".to_string()]);
        assert!(kw.contains("markets"));
        // Already in the base set, not duplicated
        assert_eq!(kw.matches("tax").count(), 1);
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_budget(text in ".{0,400}", max_len in 10usize..200) {
            let result = truncate_description(&text, max_len);
            prop_assert!(result.chars().count() <= max_len);
        }

        #[test]
        fn prop_reading_time_at_least_one(text in ".{1,2000}") {
            prop_assert!(reading_time_minutes(&text) >= 1);
        }

        #[test]
        fn prop_escape_html_output_is_inert(text in ".{0,200}") {
            let escaped = escape_html(&text);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('"'));
        }
    }
}
