//! Source buffers for the three editor panes
//!
//! Each language owns one mutable text buffer with a selection. Offsets are
//! byte offsets into the UTF-8 text and lines are split on `\n` only, so a
//! trailing newline yields a final empty line just as a textarea shows it.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

/// Style injected into every preview so host highlight messages are visible
pub const HIGHLIGHT_CLASS: &str = "copilot-highlight-element";

/// Outline applied inline to the element under a hover signal
pub const HOVER_OUTLINE: &str = "3px dashed #7ee787";

/// Outline toggled on by a click in the primary preview
pub const CLICK_OUTLINE: &str = "2px solid #00ff00";

const INJECTED_STYLE: &str = r#"
.copilot-highlight-element {
  outline: 3px solid #7ee787 !important;
  outline-offset: 2px;
  background: rgba(126, 231, 135, 0.1) !important;
}
[contenteditable="true"] {
  outline: 1px dashed rgba(126, 231, 135, 0.3);
  outline-offset: 2px;
}"#;

/// Editor pane language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Html,
    Css,
    Js,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Html, Language::Css, Language::Js];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Html => "html",
            Language::Css => "css",
            Language::Js => "js",
        };
        f.write_str(name)
    }
}

/// Selection within a buffer; `start == end` is a caret
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub start: usize,
    pub end: usize,
}

impl Cursor {
    pub fn caret(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Cursor {
    fn from(range: Range<usize>) -> Self {
        Self { start: range.start, end: range.end }
    }
}

/// A single language's text and selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBuffer {
    text: String,
    cursor: Cursor,
}

impl SourceBuffer {
    /// Create a buffer holding `text` with the caret at the start
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: Cursor::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Replace the whole text, clamping the selection into the new bounds
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let len = self.text.len();
        self.cursor = Cursor {
            start: self.cursor.start.min(len),
            end: self.cursor.end.min(len),
        };
    }

    /// Set the selection, clamped to the buffer length
    pub fn select(&mut self, cursor: Cursor) {
        let len = self.text.len();
        let start = cursor.start.min(len);
        self.cursor = Cursor {
            start,
            end: cursor.end.clamp(start, len),
        };
    }

    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.text)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Byte range covering line `line_index`, excluding its newline
    pub fn line_range(&self, line_index: usize) -> Option<Range<usize>> {
        line_range(&self.text, line_index)
    }

    /// Line containing the start of the current selection
    pub fn caret_line(&self) -> usize {
        line_at_offset(&self.text, self.cursor.start)
    }
}

/// Split text into lines the way the editor numbers them
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Byte range of a line: the sum of prior line lengths plus one per newline
pub fn line_range(text: &str, line_index: usize) -> Option<Range<usize>> {
    let mut start = 0;
    for (i, line) in text.split('\n').enumerate() {
        if i == line_index {
            return Some(start..start + line.len());
        }
        start += line.len() + 1;
    }
    None
}

/// Zero-based line of a byte offset (count of newlines before it)
pub fn line_at_offset(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
}

/// The three buffers of an editing session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferSet {
    pub html: SourceBuffer,
    pub css: SourceBuffer,
    pub js: SourceBuffer,
}

impl BufferSet {
    pub fn new(html: impl Into<String>, css: impl Into<String>, js: impl Into<String>) -> Self {
        Self {
            html: SourceBuffer::new(html),
            css: SourceBuffer::new(css),
            js: SourceBuffer::new(js),
        }
    }

    pub fn get(&self, language: Language) -> &SourceBuffer {
        match language {
            Language::Html => &self.html,
            Language::Css => &self.css,
            Language::Js => &self.js,
        }
    }

    pub fn get_mut(&mut self, language: Language) -> &mut SourceBuffer {
        match language {
            Language::Html => &mut self.html,
            Language::Css => &mut self.css,
            Language::Js => &mut self.js,
        }
    }

    /// Replace one buffer's text wholesale
    pub fn set_text(&mut self, language: Language, text: impl Into<String>) {
        self.get_mut(language).replace(text);
    }

    /// Compose the document loaded into the sandboxed preview
    ///
    /// The body is content-editable so edits can flow back to the host,
    /// and the highlight style is injected after the user's CSS.
    pub fn preview_document(&self) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n<html>\n<head>\n<style>\n{css}\n{injected}\n</style>\n</head>\n",
                "<body contenteditable=\"true\">\n{html}\n<script>\n{js}\n</script>\n</body>\n</html>\n",
            ),
            css = self.css.text(),
            injected = INJECTED_STYLE,
            html = self.html.text(),
            js = self.js.text(),
        )
    }

    /// Compose the standalone single-file website
    ///
    /// Document wrapper tags the user typed into the HTML pane are removed
    /// so the exported file has exactly one `<html>`, `<head>` and `<body>`.
    pub fn export_document(&self, title: &str) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n",
                "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
                "  <title>{title}</title>\n  <style>\n{css}\n  </style>\n</head>\n",
                "<body>\n{html}\n  <script>\n{js}\n  </script>\n</body>\n</html>",
            ),
            title = title,
            css = self.css.text(),
            html = strip_document_wrappers(self.html.text()),
            js = self.js.text(),
        )
    }
}

fn wrapper_regex() -> &'static Regex {
    static WRAPPERS: OnceLock<Regex> = OnceLock::new();
    WRAPPERS.get_or_init(|| {
        Regex::new(r"(?i)<!DOCTYPE html>|<html[^>]*>|</html>|<head[^>]*>|</head>|<body[^>]*>|</body>")
            .expect("wrapper pattern is valid")
    })
}

/// Remove doctype and html/head/body wrapper tags, case-insensitively
pub fn strip_document_wrappers(html: &str) -> String {
    wrapper_regex().replace_all(html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range() {
        let text = "<div>\n  <p>Hi</p>\n</div>";
        assert_eq!(line_range(text, 0), Some(0..5));
        assert_eq!(line_range(text, 1), Some(6..17));
        assert_eq!(&text[6..17], "  <p>Hi</p>");
        assert_eq!(line_range(text, 2), Some(18..24));
        assert_eq!(line_range(text, 3), None);
    }

    #[test]
    fn test_line_range_trailing_newline() {
        let text = "a\n";
        assert_eq!(line_range(text, 1), Some(2..2));
    }

    #[test]
    fn test_line_at_offset() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_at_offset(text, 0), 0);
        assert_eq!(line_at_offset(text, 4), 1);
        assert_eq!(line_at_offset(text, 8), 2);
        assert_eq!(line_at_offset(text, 999), 2);
    }

    #[test]
    fn test_replace_clamps_cursor() {
        let mut buffer = SourceBuffer::new("hello world");
        buffer.select(Cursor { start: 6, end: 11 });
        buffer.replace("hi");
        assert_eq!(buffer.cursor(), Cursor { start: 2, end: 2 });
    }

    #[test]
    fn test_select_orders_bounds() {
        let mut buffer = SourceBuffer::new("abc");
        buffer.select(Cursor { start: 2, end: 1 });
        assert_eq!(buffer.cursor(), Cursor { start: 2, end: 2 });
    }

    #[test]
    fn test_buffer_set_access() {
        let mut set = BufferSet::new("<p>x</p>", "p {}", "");
        set.set_text(Language::Js, "console.log(1);");
        assert_eq!(set.get(Language::Js).text(), "console.log(1);");
        assert_eq!(set.get(Language::Css).text(), "p {}");
    }

    #[test]
    fn test_preview_document_contents() {
        let set = BufferSet::new("<h1>Hi</h1>", "h1 { color: red; }", "let a = 1;");
        let doc = set.preview_document();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("h1 { color: red; }"));
        assert!(doc.contains(HIGHLIGHT_CLASS));
        assert!(doc.contains("<body contenteditable=\"true\">\n<h1>Hi</h1>"));
        assert!(doc.contains("let a = 1;"));
    }

    #[test]
    fn test_export_strips_wrappers() {
        let set = BufferSet::new(
            "<!DOCTYPE html><HTML lang=\"fr\"><head></head><Body class=\"x\"><p>Body</p></body></html>",
            "p { margin: 0; }",
            "",
        );
        let doc = set.export_document("My Site");
        assert!(doc.contains("<title>My Site</title>"));
        assert!(doc.contains("<p>Body</p>"));
        assert!(!doc.contains("lang=\"fr\""));
        assert!(!doc.contains("class=\"x\""));
        assert_eq!(doc.matches("<body>").count(), 1);
        assert_eq!(doc.matches("</html>").count(), 1);
    }

    #[test]
    fn test_language_serde() {
        let json = serde_json::to_string(&Language::Html).unwrap();
        assert_eq!(json, "\"html\"");
        let lang: Language = serde_json::from_str("\"css\"").unwrap();
        assert_eq!(lang, Language::Css);
    }
}
