//! # OxiLha Archive
//!
//! Reading of LZH/LHA archives (header levels 0 and 1).
//!
//! Entries are decoded with [`oxilha_lzh`] and checked against the CRC-16
//! recorded in their header. A failing entry never affects its siblings.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxilha_archive::LzhArchive;
//!
//! let archive = LzhArchive::open("archive.lzh").unwrap();
//! for (index, entry) in archive.entries().iter().enumerate() {
//!     let data = archive.extract(index).unwrap();
//!     println!("{} {} bytes", entry.name, data.len());
//! }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): [`LzhArchive::extract_all_parallel`] on rayon.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod lzh;

// Re-exports
pub use lzh::{LzhArchive, LzhEntry, LzhHeader};
pub use oxilha_lzh::{DecodeOptions, LzhMethod};
