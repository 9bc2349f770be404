//! # OxiLha Core
//!
//! Core components shared by the OxiLha crates:
//!
//! - [`bitcursor`]: Bit-precision cursor over in-memory buffers
//! - [`ringbuffer`]: Sliding history window for LZSS back-references
//! - [`crc`]: CRC-16 as recorded in LHA headers
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     list / extract / test                               │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     LZH level 0/1 header parsing                        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Stored (lh0), LZSS + per-block Huffman (lh4-lh7)    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Bit cursor (this crate)                             │
//! │     BitCursor, RingBuffer, CRC-16                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxilha_core::bitcursor::BitCursor;
//! use oxilha_core::crc::Crc16;
//!
//! let data = [0xAB, 0xCD];
//! let mut cursor = BitCursor::new(&data);
//! assert_eq!(cursor.read_bits(12).unwrap(), 0xABC);
//!
//! assert_eq!(Crc16::compute(b"123456789"), 0xBB3D);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitcursor;
pub mod crc;
pub mod error;
pub mod ringbuffer;

// Re-exports for convenience
pub use bitcursor::{BitCursor, Endianness};
pub use crc::Crc16;
pub use error::{OxiLhaError, Result};
pub use ringbuffer::RingBuffer;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitcursor::{BitCursor, Endianness};
    pub use crate::crc::Crc16;
    pub use crate::error::{OxiLhaError, Result};
    pub use crate::ringbuffer::RingBuffer;
}
