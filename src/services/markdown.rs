//! Markdown rendering service
//!
//! Converts article and discussion markdown to HTML using pulldown-cmark.
//! Raw HTML embedded in the source is passed through; the crawler-facing
//! renderer escapes everything it emits separately.

use pulldown_cmark::{html, Options, Parser};

/// A thread-safe Markdown renderer.
///
/// Supports headings, lists, links, blockquotes, code blocks, tables,
/// task lists, strikethrough and smart punctuation.
#[derive(Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Creates a new renderer with the extensions enabled that the
    /// editors actually use.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_rendering() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Heading\n\nThis is **bold** text.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_tables() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_strikethrough() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("~~removed~~");
        assert!(html.contains("<del>"));
    }

    #[test]
    fn test_empty_input() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(""), "");
    }
}
