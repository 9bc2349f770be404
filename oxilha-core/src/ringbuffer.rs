//! Ring buffer (sliding window) for LZSS decompression.
//!
//! The buffer keeps the most recent `2^history_bits` output bytes in emission
//! order. LZH back-references are zero-based: distance 0 names the byte
//! written last, so the source of a copy is
//! `(position - distance - 1) mod capacity`.
//!
//! # Sizes
//!
//! | Method | history bits | window |
//! |--------|--------------|--------|
//! | lh4    | 12           | 4 KB   |
//! | lh5    | 14           | 16 KB  |
//! | lh6    | 16           | 64 KB  |
//! | lh7    | 17           | 128 KB |

use crate::error::{OxiLhaError, Result};

/// Largest history window the decoder accepts (2^24 bytes).
pub const MAX_HISTORY_BITS: u8 = 24;

/// A circular history buffer for back-reference copies.
///
/// The window starts zero-filled, so references that reach before the first
/// emitted byte read zeros.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// The underlying buffer.
    buffer: Vec<u8>,
    /// Next write index.
    position: usize,
    /// `capacity - 1`.
    mask: usize,
}

impl RingBuffer {
    /// Create a zero-filled window of `2^history_bits` bytes.
    ///
    /// `history_bits` is clamped to [`MAX_HISTORY_BITS`].
    pub fn new(history_bits: u8) -> Self {
        let capacity = 1usize << history_bits.min(MAX_HISTORY_BITS);
        Self {
            buffer: vec![0; capacity],
            position: 0,
            mask: capacity - 1,
        }
    }

    /// Window size in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Index the next byte will be written to.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Append one byte to the window.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
    }

    /// Copy `length` bytes starting `distance + 1` bytes back, appending each
    /// to `output` and writing it back into the window.
    ///
    /// Source and destination may overlap: when `distance < length` the copy
    /// re-reads bytes it has just written, which repeats the last
    /// `distance + 1` bytes.
    pub fn copy_from_history(
        &mut self,
        distance: usize,
        length: usize,
        output: &mut Vec<u8>,
    ) -> Result<()> {
        if distance >= self.capacity() {
            return Err(OxiLhaError::invalid_distance(distance, self.capacity()));
        }

        output.reserve(length);
        let mut source = (self.position + self.capacity() - distance - 1) & self.mask;
        for _ in 0..length {
            let byte = self.buffer[source];
            output.push(byte);
            self.write_byte(byte);
            source = (source + 1) & self.mask;
        }

        Ok(())
    }
}
