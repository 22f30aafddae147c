//! Position and span tracking for source locations
//!
//! Positions are 0-based line/column pairs over the document text. Spans are
//! start/end position pairs used for round-trip bookkeeping and for mapping
//! logical elements to exact text ranges (UI highlighting).

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A position in the document (0-based line and column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Advance this position over `text`, treating `\n` as a line break.
    pub fn advanced(self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A start/end position pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `at`.
    pub fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn contains(&self, pos: Position) -> bool {
        (self.start.line < pos.line
            || (self.start.line == pos.line && self.start.column <= pos.column))
            && (self.end.line > pos.line
                || (self.end.line == pos.line && self.end.column >= pos.column))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Fast conversion from byte offsets to line/column positions.
///
/// Built once per parse from the source text; used to attach positions to
/// parse errors before the tree exists.
pub struct SourceLocation {
    line_starts: Vec<usize>,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }
        Self { line_starts }
    }

    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);
        let column = byte_offset - self.line_starts[line];
        Position::new(line, column)
    }

    pub fn range_to_span(&self, range: &Range<usize>) -> Span {
        Span::new(
            self.byte_to_position(range.start),
            self.byte_to_position(range.end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_over_plain_text() {
        let pos = Position::new(0, 0).advanced("key = value");
        assert_eq!(pos, Position::new(0, 11));
    }

    #[test]
    fn advance_over_newlines() {
        let pos = Position::new(2, 7).advanced("a\nbc\n");
        assert_eq!(pos, Position::new(4, 0));
    }

    #[test]
    fn byte_to_position_multiline() {
        let loc = SourceLocation::new("[a]\nx=1\n");
        assert_eq!(loc.byte_to_position(0), Position::new(0, 0));
        assert_eq!(loc.byte_to_position(4), Position::new(1, 0));
        assert_eq!(loc.byte_to_position(6), Position::new(1, 2));
    }

    #[test]
    fn span_contains_boundaries() {
        let span = Span::new(Position::new(1, 2), Position::new(1, 6));
        assert!(span.contains(Position::new(1, 2)));
        assert!(span.contains(Position::new(1, 6)));
        assert!(!span.contains(Position::new(1, 7)));
        assert!(!span.contains(Position::new(0, 3)));
    }
}
