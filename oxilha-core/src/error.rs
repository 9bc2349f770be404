//! Error types for OxiLha operations.
//!
//! Every failure in the decode path is fatal for the entry being decoded and
//! never for its siblings. Nothing is retried internally; a caller that wants
//! another attempt re-runs the decode from scratch.

use std::io;
use thiserror::Error;

/// The main error type for OxiLha operations.
#[derive(Debug, Error)]
pub enum OxiLhaError {
    /// I/O error from an underlying file or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read needed more bits than the cursor had left.
    #[error("Stream underrun: requested {requested} bit(s) at bit {position}, {available} available")]
    StreamUnderrun {
        /// Number of bits the read asked for.
        requested: u64,
        /// Number of bits left in the cursor.
        available: u64,
        /// Cursor position (in bits) where the read was attempted.
        position: u64,
    },

    /// A bit read was asked for a width the cursor cannot produce.
    #[error("Invalid bit count: {count} (expected 1..=32)")]
    InvalidBitCount {
        /// The rejected width.
        count: u32,
    },

    /// A Huffman table could not be built or could not resolve a symbol.
    #[error("Invalid Huffman table: {message}")]
    InvalidHuffmanTable {
        /// Description of the failure.
        message: String,
    },

    /// No decoder exists for the method id.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The method identifier, as found in the header.
        method: String,
    },

    /// A stored entry's payload length differs from its declared size.
    #[error("Size mismatch: declared {expected} bytes, found {actual}")]
    SizeMismatch {
        /// Declared uncompressed size.
        expected: u64,
        /// Length of the supplied payload.
        actual: u64,
    },

    /// A back-reference reaches further back than the history window.
    #[error("Invalid back-reference distance: {distance} exceeds window size {window_size}")]
    InvalidDistance {
        /// Decoded distance.
        distance: usize,
        /// Size of the history window.
        window_size: usize,
    },

    /// The caller cancelled the decode.
    #[error("Decode cancelled")]
    Cancelled,

    /// The declared output size exceeds the configured cap.
    #[error("Output limit exceeded: entry declares {requested} bytes, limit is {limit}")]
    OutputLimitExceeded {
        /// Declared uncompressed size.
        requested: u64,
        /// Configured maximum.
        limit: u64,
    },

    /// Invalid container header.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// CRC-16 of the decoded data does not match the header.
    #[error("CRC mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        /// CRC stored in the archive.
        expected: u16,
        /// CRC computed over the decoded bytes.
        computed: u16,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name that was looked up.
        name: String,
    },
}

/// Result type alias for OxiLha operations.
pub type Result<T> = std::result::Result<T, OxiLhaError>;

impl OxiLhaError {
    /// Create a stream underrun error.
    pub fn underrun(requested: u64, available: u64, position: u64) -> Self {
        Self::StreamUnderrun {
            requested,
            available,
            position,
        }
    }

    /// Create an invalid bit count error.
    pub fn invalid_bit_count(count: u32) -> Self {
        Self::InvalidBitCount { count }
    }

    /// Create an invalid Huffman table error.
    pub fn invalid_huffman(message: impl Into<String>) -> Self {
        Self::InvalidHuffmanTable {
            message: message.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a size mismatch error.
    pub fn size_mismatch(expected: u64, actual: u64) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, window_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            window_size,
        }
    }

    /// Create an output limit error.
    pub fn output_limit(requested: u64, limit: u64) -> Self {
        Self::OutputLimitExceeded { requested, limit }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u16, computed: u16) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Whether this error came out of the decode path itself (as opposed to
    /// container parsing, lookup or I/O).
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::StreamUnderrun { .. }
                | Self::InvalidBitCount { .. }
                | Self::InvalidHuffmanTable { .. }
                | Self::InvalidDistance { .. }
                | Self::SizeMismatch { .. }
                | Self::Cancelled
                | Self::OutputLimitExceeded { .. }
        )
    }
}
