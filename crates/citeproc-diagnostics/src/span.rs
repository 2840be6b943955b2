//! Byte ranges into a source document.

use serde::{Deserialize, Serialize};

/// A half-open byte range `start..end` into a document's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn start_offset(&self) -> usize {
        self.start
    }

    pub fn end_offset(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based line and column of the span start within `content`.
    pub fn line_col(&self, content: &str) -> (usize, usize) {
        let offset = self.start.min(content.len());
        let before = &content[..floor_char_boundary(content, offset)];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(pos) => before[pos + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A named document whose text is available for rendering source snippets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Display name, usually the path the document was read from.
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_first_line() {
        let span = SourceSpan::new(3, 5);
        assert_eq!(span.line_col("<style/>"), (1, 4));
    }

    #[test]
    fn test_line_col_later_line() {
        let content = "<style>\n  <citation/>\n</style>";
        let offset = content.find("<citation").unwrap();
        let span = SourceSpan::new(offset, offset + 10);
        assert_eq!(span.line_col(content), (2, 3));
    }

    #[test]
    fn test_line_col_past_end_is_clamped() {
        let span = SourceSpan::new(100, 120);
        assert_eq!(span.line_col("ab"), (1, 3));
    }

    #[test]
    fn test_len() {
        assert_eq!(SourceSpan::new(2, 7).len(), 5);
        assert!(SourceSpan::default().is_empty());
    }
}
