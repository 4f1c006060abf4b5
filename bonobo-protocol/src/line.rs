//! Line framing for the serial console.
//!
//! Bytes are accumulated until a line feed arrives. The buffer is bounded:
//! bytes beyond [`MAX_LINE_LEN`] are dropped, but the line is still
//! delivered (truncated) when its terminator arrives.

use heapless::Vec;

/// Maximum number of stored bytes per command line
pub const MAX_LINE_LEN: usize = 64;

/// Line terminator
pub const LINE_FEED: u8 = b'\n';

/// Carriage return, discarded so CRLF senders work unchanged
pub const CARRIAGE_RETURN: u8 = b'\r';

/// A complete command line, without its terminator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    /// Stored bytes (at most [`MAX_LINE_LEN`])
    pub bytes: Vec<u8, MAX_LINE_LEN>,
    /// Bytes were dropped because the line exceeded the bound
    pub truncated: bool,
}

impl Line {
    /// Build a line from a byte slice, applying the same bound as the buffer
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buffer = LineBuffer::new();
        for &byte in bytes {
            buffer.push(byte);
        }
        buffer.take()
    }

    /// The line content
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check if the line holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Line content as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }
}

/// Accumulates serial bytes into command lines
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    buffer: Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl LineBuffer {
    /// Create an empty line buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            truncated: false,
        }
    }

    /// Clear the buffer for the next command
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.truncated = false;
    }

    /// Number of bytes currently stored
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no bytes are stored
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Store a content byte, dropping it if the buffer is full
    fn push(&mut self, byte: u8) {
        if self.buffer.push(byte).is_err() {
            self.truncated = true;
        }
    }

    /// Move the accumulated bytes out as a line and reset
    fn take(&mut self) -> Line {
        let line = Line {
            bytes: self.buffer.clone(),
            truncated: self.truncated,
        };
        self.reset();
        line
    }

    /// Feed a single byte
    ///
    /// Returns `Some(line)` when the byte terminates a line, `None` while
    /// the line is still being accumulated.
    pub fn feed(&mut self, byte: u8) -> Option<Line> {
        match byte {
            LINE_FEED => Some(self.take()),
            CARRIAGE_RETURN => None,
            _ => {
                self.push(byte);
                None
            }
        }
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete line and the number of bytes consumed.
    /// Bytes after the terminator are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<Line>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(line) = self.feed(byte) {
                return (Some(line), i + 1);
            }
        }
        (None, bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_line_completes_on_line_feed() {
        let mut buffer = LineBuffer::new();
        let (line, used) = buffer.feed_bytes(b"G1 X10\n");
        let line = line.unwrap();
        assert_eq!(used, 7);
        assert_eq!(line.as_bytes(), b"G1 X10");
        assert!(!line.truncated);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_carriage_return_dropped() {
        let mut buffer = LineBuffer::new();
        let (line, _) = buffer.feed_bytes(b"M114\r\n");
        assert_eq!(line.unwrap().as_bytes(), b"M114");
    }

    #[test]
    fn test_partial_line_pending() {
        let mut buffer = LineBuffer::new();
        let (line, used) = buffer.feed_bytes(b"G92 X");
        assert!(line.is_none());
        assert_eq!(used, 5);
        assert_eq!(buffer.len(), 5);

        let (line, _) = buffer.feed_bytes(b"0\n");
        assert_eq!(line.unwrap().as_bytes(), b"G92 X0");
    }

    #[test]
    fn test_remaining_bytes_not_consumed() {
        let mut buffer = LineBuffer::new();
        let (line, used) = buffer.feed_bytes(b"M17\nM18\n");
        assert_eq!(line.unwrap().as_bytes(), b"M17");
        assert_eq!(used, 4);
    }

    #[test]
    fn test_empty_line_delivered() {
        let mut buffer = LineBuffer::new();
        let line = buffer.feed(b'\n').unwrap();
        assert!(line.is_empty());
    }

    #[test]
    fn test_overflow_truncates_but_delivers() {
        let mut buffer = LineBuffer::new();
        for _ in 0..MAX_LINE_LEN + 10 {
            assert!(buffer.feed(b'A').is_none());
        }
        assert_eq!(buffer.len(), MAX_LINE_LEN);

        let line = buffer.feed(b'\n').unwrap();
        assert_eq!(line.bytes.len(), MAX_LINE_LEN);
        assert!(line.truncated);

        // Next line starts clean
        let line = buffer.feed_bytes(b"M100\n").0.unwrap();
        assert_eq!(line.as_bytes(), b"M100");
        assert!(!line.truncated);
    }

    #[test]
    fn test_line_from_bytes() {
        let line = Line::from_bytes(b"G1 X1");
        assert_eq!(line.as_str(), Some("G1 X1"));
    }

    proptest! {
        #[test]
        fn prop_line_never_exceeds_bound(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut buffer = LineBuffer::new();
            for byte in data {
                if let Some(line) = buffer.feed(byte) {
                    prop_assert!(line.bytes.len() <= MAX_LINE_LEN);
                    prop_assert!(!line.bytes.contains(&LINE_FEED));
                }
                prop_assert!(buffer.len() <= MAX_LINE_LEN);
            }
        }

        #[test]
        fn prop_short_lines_pass_through(text in "[A-Z0-9. -]{0,64}") {
            let mut buffer = LineBuffer::new();
            let (line, _) = buffer.feed_bytes(text.as_bytes());
            prop_assert!(line.is_none());
            let line = buffer.feed(LINE_FEED).unwrap();
            prop_assert_eq!(line.as_bytes(), text.as_bytes());
            prop_assert!(!line.truncated);
        }
    }
}
