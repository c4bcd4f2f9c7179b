//! Source locations of document fragments.
//!
//! Loaders record where each element's start tag sits so findings can point a
//! diagnostics view at the offending XML.

/// A span covering a start tag (0-indexed lines and columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in a document (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates
    pub fn from_coords(
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// Check if a position falls within this span
    pub fn contains(&self, position: Position) -> bool {
        if position.line < self.start.line || position.line > self.end.line {
            return false;
        }
        if position.line == self.start.line && position.column < self.start.column {
            return false;
        }
        if position.line == self.end.line && position.column > self.end.column {
            return false;
        }
        true
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset inside `text`.
    ///
    /// Offsets past the end clamp to the final position.
    pub fn at_offset(text: &[u8], offset: usize) -> Self {
        Self::default().advance(&text[..offset.min(text.len())])
    }

    /// The position reached after reading `bytes` from here. Columns count
    /// characters, so UTF-8 continuation bytes do not advance them.
    pub fn advance(self, bytes: &[u8]) -> Self {
        let Self {
            mut line,
            mut column,
        } = self;
        for &byte in bytes {
            if byte == b'\n' {
                line += 1;
                column = 0;
            } else if byte & 0xC0 != 0x80 {
                column += 1;
            }
        }
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}
