//! Output buffer with tail-limited pattern search.
//!
//! Prompt and pager markers only ever appear at the end of what the device
//! has sent, so searching is restricted to the last `search_depth` bytes of
//! the accumulated output. For large outputs (a full running configuration)
//! this keeps per-read matching cost flat.

use regex::bytes::Regex;

/// Buffer accumulating session output between pattern matches.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new buffer searching the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append new channel data.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Whether `pattern` matches within the buffer tail.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.buffer[start..])
    }

    /// Take the buffer contents as a string, resetting the buffer.
    pub fn take_string(&mut self) -> String {
        let bytes = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer holds no data.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard buffered data.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_search_finds_prompt_at_end() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nswitch#");

        let pattern = Regex::new(r"switch#").unwrap();
        assert!(buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_tail_search_ignores_old_data() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"switch#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"switch#").unwrap();
        assert!(!buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_take_string_resets() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"some output");
        assert_eq!(buffer.take_string(), "some output");
        assert!(buffer.is_empty());
    }
}
