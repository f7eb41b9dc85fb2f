//! Stream cursors for byte and line sources
//!
//! A cursor wraps a finite, fully read source and tracks a monotonically
//! non-decreasing position. `peek` never advances and never pads: at end
//! of stream it simply returns less than requested. `advance` past the
//! end is a fatal contract violation, not a recoverable condition.

use crate::app::models::StreamPosition;
use crate::{Error, Result};

/// Cursor over a finite byte stream (binary telemetry sources)
#[derive(Debug)]
pub struct ByteCursor {
    data: Vec<u8>,
    index: usize,
}

impl ByteCursor {
    /// Wrap a fully read byte source
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, index: 0 }
    }

    /// Up to `n` bytes at the current position, without advancing
    pub fn peek(&self, n: usize) -> &[u8] {
        let end = (self.index + n).min(self.data.len());
        &self.data[self.index..end]
    }

    /// Bytes at `offset` past the current position, without advancing
    pub fn peek_at(&self, offset: usize, n: usize) -> &[u8] {
        let start = (self.index + offset).min(self.data.len());
        let end = (start + n).min(self.data.len());
        &self.data[start..end]
    }

    /// Move the position forward by `n` bytes
    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::out_of_range(n, self.remaining()));
        }
        self.index += n;
        Ok(())
    }

    /// True when no further bytes remain
    pub fn at_end(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Number of unconsumed bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Current position as a byte offset
    pub fn position(&self) -> StreamPosition {
        StreamPosition::new(self.index as u64, true)
    }
}

/// Cursor over a finite line stream (text and CSV sources)
///
/// Lines are delimiter-stripped up front; the position is a zero-based
/// line number.
#[derive(Debug)]
pub struct LineCursor {
    lines: Vec<String>,
    index: usize,
}

impl LineCursor {
    /// Split text content into delimiter-stripped lines
    pub fn new(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
            index: 0,
        }
    }

    /// The next line, without advancing; `None` at end of stream
    pub fn peek_line(&self) -> Option<&str> {
        self.lines.get(self.index).map(String::as_str)
    }

    /// Move the position forward by `n` lines
    pub fn advance_lines(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::out_of_range(n, self.remaining()));
        }
        self.index += n;
        Ok(())
    }

    /// True when no further lines remain
    pub fn at_end(&self) -> bool {
        self.index >= self.lines.len()
    }

    /// Number of unconsumed lines
    pub fn remaining(&self) -> usize {
        self.lines.len() - self.index
    }

    /// Current position as a line number
    pub fn position(&self) -> StreamPosition {
        StreamPosition::new(self.index as u64, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_cursor_peek_does_not_advance() {
        let cursor = ByteCursor::new(vec![1, 2, 3, 4]);
        assert_eq!(cursor.peek(2), &[1, 2]);
        assert_eq!(cursor.peek(2), &[1, 2]);
        assert_eq!(cursor.position().index, 0);
    }

    #[test]
    fn test_byte_cursor_peek_short_at_end() {
        let mut cursor = ByteCursor::new(vec![1, 2, 3]);
        cursor.advance(2).unwrap();
        // Fewer bytes than requested, never padded
        assert_eq!(cursor.peek(10), &[3]);
        assert!(!cursor.at_end());
        cursor.advance(1).unwrap();
        assert!(cursor.at_end());
        assert_eq!(cursor.peek(1), &[] as &[u8]);
    }

    #[test]
    fn test_byte_cursor_advance_out_of_range() {
        let mut cursor = ByteCursor::new(vec![1, 2]);
        let err = cursor.advance(3).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                requested: 3,
                remaining: 2
            }
        ));
        // Position unchanged after the failed advance
        assert_eq!(cursor.position().index, 0);
    }

    #[test]
    fn test_byte_cursor_peek_at_offset() {
        let cursor = ByteCursor::new(vec![10, 20, 30, 40]);
        assert_eq!(cursor.peek_at(2, 2), &[30, 40]);
        assert_eq!(cursor.peek_at(3, 5), &[40]);
        assert_eq!(cursor.peek_at(9, 1), &[] as &[u8]);
    }

    #[test]
    fn test_byte_cursor_position_monotonic() {
        let mut cursor = ByteCursor::new(vec![0; 10]);
        let mut last = cursor.position().index;
        for _ in 0..5 {
            cursor.advance(2).unwrap();
            let now = cursor.position().index;
            assert!(now >= last);
            last = now;
        }
        assert!(cursor.at_end());
    }

    #[test]
    fn test_line_cursor_strips_delimiters() {
        let mut cursor = LineCursor::new("alpha\nbravo\r\ncharlie\n");
        assert_eq!(cursor.peek_line(), Some("alpha"));
        cursor.advance_lines(1).unwrap();
        assert_eq!(cursor.peek_line(), Some("bravo"));
        cursor.advance_lines(2).unwrap();
        assert!(cursor.at_end());
        assert_eq!(cursor.peek_line(), None);
    }

    #[test]
    fn test_line_cursor_out_of_range() {
        let mut cursor = LineCursor::new("one\ntwo\n");
        assert!(cursor.advance_lines(3).is_err());
        assert_eq!(cursor.position().index, 0);
    }

    #[test]
    fn test_empty_sources_start_at_end() {
        assert!(ByteCursor::new(Vec::new()).at_end());
        assert!(LineCursor::new("").at_end());
    }
}
