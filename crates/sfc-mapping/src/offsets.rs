//! Byte offsets, spans and line indexes.

use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A half-open `[start, end)` range of byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates an empty span at the given offset.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Like [`Span::contains`], but also accepts the exclusive end position.
    /// Useful for cursor positions, which may sit just past the content.
    #[inline]
    pub fn contains_inclusive(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Clamps an offset into this span.
    #[inline]
    pub fn clamp(&self, offset: ByteOffset) -> ByteOffset {
        offset.max(self.start).min(self.end)
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(span.start, span.end)
    }
}

/// A line and column position, both 0-indexed. Columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed byte column within the line.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Byte offset ↔ line/column conversion table for one text buffer.
///
/// Stores the start offset of every line; lookups are O(log n). The index is
/// only valid for the exact text it was built from and must be rebuilt
/// whenever that text changes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<ByteOffset>,
    text_len: ByteOffset,
}

impl LineIndex {
    /// Builds a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self {
            line_starts,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    /// Returns the number of lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the length of the indexed text.
    #[inline]
    pub fn text_len(&self) -> ByteOffset {
        self.text_len
    }

    /// Converts a byte offset to a line/column position, clamping offsets
    /// past the end of the text onto the final position.
    pub fn position_at(&self, offset: ByteOffset) -> LineCol {
        let offset = offset.min(self.text_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32,
            col,
        }
    }

    /// Converts a line/column position to a byte offset, clamping both the
    /// line and the column to what the text actually contains.
    pub fn offset_at(&self, pos: LineCol) -> ByteOffset {
        let line = (pos.line as usize).min(self.line_starts.len() - 1);
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text_len);
        (line_start + TextSize::from(pos.col)).min(line_end)
    }

    /// Returns the byte offset where a line starts, if the line exists.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }
}

/// Rounds a byte index down to the nearest char boundary of `text`.
///
/// Byte columns arriving from outside can land inside a multibyte
/// character; slicing or splicing at such an index would panic.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains() {
        let span = Span::new(5u32, 15u32);
        assert!(!span.contains(TextSize::from(4)));
        assert!(span.contains(TextSize::from(5)));
        assert!(!span.contains(TextSize::from(15)));
        assert!(span.contains_inclusive(TextSize::from(15)));
    }

    #[test]
    fn span_clamp() {
        let span = Span::new(5u32, 15u32);
        assert_eq!(span.clamp(TextSize::from(2)), TextSize::from(5));
        assert_eq!(span.clamp(TextSize::from(10)), TextSize::from(10));
        assert_eq!(span.clamp(TextSize::from(99)), TextSize::from(15));
    }

    #[test]
    fn position_roundtrip() {
        let text = "let a = 1;\nlet b = 2;\n\nexport { a };";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            let offset = TextSize::from(offset as u32);
            let pos = index.position_at(offset);
            assert_eq!(index.offset_at(pos), offset);
        }
    }

    #[test]
    fn offset_clamps_past_line_end() {
        let index = LineIndex::new("ab\ncd");
        // Column far past the end of line 0 lands on the newline, not line 1.
        assert_eq!(index.offset_at(LineCol::new(0, 99)), TextSize::from(3));
        // Line past the end of the text clamps to the last line.
        assert_eq!(index.offset_at(LineCol::new(7, 1)), TextSize::from(4));
    }

    #[test]
    fn position_clamps_past_text_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.position_at(TextSize::from(200)), LineCol::new(1, 2));
    }

    #[test]
    fn char_boundary_rounds_down() {
        let text = "héllo";
        // 'é' occupies bytes 1 and 2.
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(floor_char_boundary(text, 3), 3);
        assert_eq!(floor_char_boundary(text, 99), text.len());
    }
}
