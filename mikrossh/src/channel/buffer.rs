//! Pattern buffer with tail-search optimization and ANSI stripping.
//!
//! Only the last N bytes are searched for prompt patterns, so a huge
//! `/export` does not make every read quadratic. Literal searches (command
//! echoes) scan the whole unread region because the echo sits at the front.

use std::fmt;
use std::ops::Range;

use bytes::BytesMut;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer of unread device output.
///
/// Bytes past a consumed match stay in the buffer for the next read, so
/// nothing the device sent is lost between reads.
pub struct PatternBuffer {
    /// Unread output (ANSI-stripped when enabled).
    buffer: BytesMut,

    /// How many bytes from the end to search for prompt patterns.
    search_depth: usize,

    /// Whether escape sequences are removed as data arrives.
    strip_ansi: bool,

    /// Escape-sequence parser. Kept across chunks so sequences split between
    /// two reads are still recognized.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            strip_ansi: false,
            parser: Parser::new(),
        }
    }

    /// Enable or disable ANSI escape stripping for data added from now on.
    pub fn set_strip_ansi(&mut self, strip: bool) {
        self.strip_ansi = strip;
    }

    /// Append newly read data.
    pub fn extend(&mut self, data: &[u8]) {
        if !self.strip_ansi {
            self.buffer.extend_from_slice(data);
            return;
        }

        let mut printer = Printer {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printer, data);
    }

    /// Search the tail of the buffer for a pattern.
    ///
    /// The returned range is relative to the start of the whole buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Range<usize>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[start..])
            .map(|m| (start + m.start())..(start + m.end()))
    }

    /// Search the entire unread buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<Range<usize>> {
        pattern.find(&self.buffer).map(|m| m.range())
    }

    /// Find the first byte that belongs to `charset`, returning its offset.
    pub fn find_any_of(&self, charset: &[u8]) -> Option<usize> {
        match *charset {
            [] => None,
            [a] => memchr::memchr(a, &self.buffer),
            [a, b] => memchr::memchr2(a, b, &self.buffer),
            [a, b, c] => memchr::memchr3(a, b, c, &self.buffer),
            _ => self.buffer.iter().position(|byte| charset.contains(byte)),
        }
    }

    /// Remove and return everything up to `end` (exclusive).
    pub fn consume_to(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).to_vec()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("buffer", &self.as_str_lossy())
            .field("search_depth", &self.search_depth)
            .field("strip_ansi", &self.strip_ansi)
            .finish()
    }
}

/// Collects printable text and the layout control bytes, dropping escapes.
struct Printer<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printer<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // Line structure and backspaces matter for prompt and echo handling.
        if matches!(byte, b'\n' | b'\r' | b'\t' | 0x08) {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_kept_when_disabled() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen\x1b[0m");
        assert_eq!(buffer.as_slice(), b"\x1b[32mGreen\x1b[0m");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.set_strip_ansi(true);
        buffer.extend(b"\x1b[9999B[admin@hostname] > ");
        assert_eq!(buffer.as_slice(), b"[admin@hostname] > ");
    }

    #[test]
    fn test_ansi_sequence_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.set_strip_ansi(true);
        buffer.extend(b"line one\r\n\x1b[99");
        buffer.extend(b"99B[admin@MikroTik] > ");
        assert_eq!(buffer.as_slice(), b"line one\r\n[admin@MikroTik] > ");
    }

    #[test]
    fn test_tail_search_offsets_are_absolute() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\n[admin@r1] > ");

        let pattern = Regex::new(r"\[admin@r1\] >\s*$").unwrap();
        let range = buffer.search_tail(&pattern).unwrap();
        assert_eq!(range.start, 101);
        assert_eq!(range.end, buffer.len());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"[admin@r1] >");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"\[admin@r1\] >").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
        assert!(buffer.search_full(&pattern).is_some());
    }

    #[test]
    fn test_find_any_of() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"MikroTik [admin@r1] >");
        assert_eq!(buffer.find_any_of(b"]>"), Some(18));
        assert_eq!(buffer.find_any_of(b">"), Some(20));
        assert_eq!(buffer.find_any_of(b"#$"), None);
        assert_eq!(buffer.find_any_of(b"#$%]"), Some(18));
    }

    #[test]
    fn test_consume_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"echo\r\noutput");
        assert_eq!(buffer.consume_to(4), b"echo");
        assert_eq!(buffer.as_slice(), b"\r\noutput");
        assert_eq!(buffer.take(), b"\r\noutput");
        assert!(buffer.is_empty());
    }
}
