use std::collections::VecDeque;

/// Byte buffer that hands out complete `\n`-terminated lines.
///
/// Bytes stay undecoded until their line is complete, so a multi-byte
/// character split across two transport chunks is never corrupted.
/// Whatever follows the last newline remains buffered as the partial line.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (without its `\n` or a trailing `\r`).
    /// Returns None if no complete line is available.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than failing the line.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        Some(String::from_utf8_lossy(&line_bytes).into_owned())
    }

    /// Drop the unterminated tail, returning how many bytes were discarded
    pub fn discard_partial(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_buffer_basic() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"data: x\r\n\n");
        assert_eq!(buffer.next_line().unwrap(), "data: x");
        assert_eq!(buffer.next_line().unwrap(), "");
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn test_leading_whitespace_is_kept() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"  data: x\n");
        assert_eq!(buffer.next_line().unwrap(), "  data: x");
    }

    #[test]
    fn test_multibyte_split_across_extends() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let bytes = "olá\n".as_bytes();

        // 'á' is two bytes; split between them
        buffer.extend(&bytes[..3]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[3..]);
        assert_eq!(buffer.next_line().unwrap(), "olá");
    }

    #[test]
    fn test_discard_partial() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"done\ntail");
        assert_eq!(buffer.next_line().unwrap(), "done");
        assert_eq!(buffer.discard_partial(), 4);
        assert!(buffer.is_empty());
    }
}
