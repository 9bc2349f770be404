//! # OxiLha LZH
//!
//! Pure Rust decoder for the LZH compression methods used by LHA archives,
//! which were particularly popular in Japan. Supported methods:
//!
//! - **lh0**: Stored (no compression)
//! - **lh4**: 4KB window, static Huffman
//! - **lh5**: 16KB window, static Huffman (most common)
//! - **lh6**: 64KB window, static Huffman
//! - **lh7**: 128KB window, static Huffman
//!
//! Each compressed entry is decoded from an in-memory buffer into exactly
//! its declared uncompressed size. A failed decode never yields partial
//! output.
//!
//! ## Example
//!
//! ```rust
//! use oxilha_lzh::{Decoder, LzhMethod};
//!
//! let decoder = Decoder::for_method(b"-lh0-").expect("known method");
//! let output = decoder.decode(b"Hello, World!", 13).unwrap();
//! assert_eq!(output, b"Hello, World!");
//!
//! assert_eq!(Decoder::from(LzhMethod::Lh5), Decoder::for_method(b"-lh5-").unwrap());
//! ```
//!
//! ## Cancellation
//!
//! ```rust
//! use oxilha_lzh::{DecodeOptions, Decoder};
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! let flag = Arc::new(AtomicBool::new(false));
//! let options = DecodeOptions::new()
//!     .with_cancel_flag(Arc::clone(&flag))
//!     .with_max_output(1 << 20);
//!
//! let decoder = Decoder::for_method(b"-lh5-").unwrap();
//! assert!(decoder.decode_with(&[], 0, &options).unwrap().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod decode;
pub mod huffman;
pub mod methods;

// Re-exports
pub use block::{BlockDecoder, DecoderState};
pub use decode::{DecodeOptions, Decoder, decode_entry, decode_lzh};
pub use huffman::HuffmanTree;
pub use methods::{DecoderConfig, LzhMethod};
