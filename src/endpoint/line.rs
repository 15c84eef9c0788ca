// Fixed-capacity line accumulator

use crate::config::LINE_CAPACITY;

/// Bytes received since the last delimiter, capped at `LINE_CAPACITY`.
/// Bytes past the cursor are always zero.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    bytes: [u8; LINE_CAPACITY],
    cursor: usize,
    dropped: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0; LINE_CAPACITY],
            cursor: 0,
            dropped: 0,
        }
    }

    /// Append one byte. Returns false if the buffer is full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        match self.bytes.get_mut(self.cursor) {
            Some(slot) => {
                *slot = byte;
                self.cursor += 1;
                true
            }
            None => {
                self.dropped += 1;
                false
            }
        }
    }

    /// The accumulated line (up to the cursor)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }

    /// The line as text: accumulated bytes up to the first NUL
    pub fn text(&self) -> &[u8] {
        let line = self.as_bytes();
        let end = line.iter().position(|&b| b == 0).unwrap_or(line.len());
        &line[..end]
    }

    /// Zero the whole buffer and reset the cursor
    pub fn clear(&mut self) {
        self.bytes = [0; LINE_CAPACITY];
        self.cursor = 0;
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == LINE_CAPACITY
    }

    /// Bytes dropped since the last clear
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Raw storage, including the zeroed tail
    pub fn storage(&self) -> &[u8; LINE_CAPACITY] {
        &self.bytes
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
