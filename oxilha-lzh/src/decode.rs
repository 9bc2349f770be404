//! LZH decompression entry points.
//!
//! [`Decoder`] is chosen once per entry from the 5-byte method id and holds
//! no mutable state, so one value can decode any number of entries, from any
//! number of threads.

use crate::block::BlockDecoder;
use crate::methods::{DecoderConfig, LzhMethod};
use oxilha_core::error::{OxiLhaError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Per-call decode options.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Set to `true` from any thread to stop the decode.
    cancel: Option<Arc<AtomicBool>>,
    /// Largest declared size the decoder will accept.
    max_output: Option<u64>,
}

impl DecodeOptions {
    /// Options with no cancellation and no output cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Refuse entries declaring more than `limit` bytes.
    pub fn with_max_output(mut self, limit: u64) -> Self {
        self.max_output = Some(limit);
        self
    }

    /// The attached cancellation flag, if any.
    pub fn cancel_flag(&self) -> Option<&Arc<AtomicBool>> {
        self.cancel.as_ref()
    }

    /// Configured output cap.
    pub fn max_output(&self) -> Option<u64> {
        self.max_output
    }

    /// Raise the cancellation flag. No-op without one.
    pub fn cancel(&self) {
        if let Some(flag) = &self.cancel {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Whether the cancellation flag is raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Check `expected_len` against the cap and the address space.
    fn admit(&self, expected_len: u64) -> Result<usize> {
        if let Some(limit) = self.max_output {
            if expected_len > limit {
                return Err(OxiLhaError::output_limit(expected_len, limit));
            }
        }
        usize::try_from(expected_len)
            .map_err(|_| OxiLhaError::output_limit(expected_len, usize::MAX as u64))
    }
}

/// Decoding strategy for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Payload is the output (`-lh0-`).
    Stored,
    /// LZSS + static Huffman blocks.
    Block(DecoderConfig),
}

impl Decoder {
    /// Select the strategy for a method id, e.g. `b"-lh5-"`.
    pub fn for_method(method_id: &[u8]) -> Option<Self> {
        LzhMethod::from_id(method_id).map(Self::from)
    }

    /// Decode `data` into exactly `expected_len` bytes.
    pub fn decode(&self, data: &[u8], expected_len: u64) -> Result<Vec<u8>> {
        self.decode_with(data, expected_len, &DecodeOptions::default())
    }

    /// Decode with cancellation and an output cap.
    pub fn decode_with(
        &self,
        data: &[u8],
        expected_len: u64,
        options: &DecodeOptions,
    ) -> Result<Vec<u8>> {
        let expected = options.admit(expected_len)?;

        match self {
            Self::Stored => {
                if data.len() != expected {
                    return Err(OxiLhaError::size_mismatch(expected_len, data.len() as u64));
                }
                Ok(data.to_vec())
            }
            Self::Block(config) => {
                debug!(
                    history_bits = config.history_bits,
                    offset_bits = config.offset_bits,
                    compressed = data.len(),
                    expected,
                    "decoding block stream"
                );
                BlockDecoder::new(*config, data, expected).decode(options)
            }
        }
    }
}

impl From<LzhMethod> for Decoder {
    fn from(method: LzhMethod) -> Self {
        match method.decoder_config() {
            Some(config) => Self::Block(config),
            None => Self::Stored,
        }
    }
}

/// Decode one entry given its raw method id.
///
/// Unknown ids fail with [`OxiLhaError::UnsupportedMethod`].
pub fn decode_entry(method_id: &[u8], data: &[u8], uncompressed_size: u64) -> Result<Vec<u8>> {
    let decoder = Decoder::for_method(method_id).ok_or_else(|| {
        OxiLhaError::unsupported_method(String::from_utf8_lossy(method_id).into_owned())
    })?;
    decoder.decode(data, uncompressed_size)
}

/// Decompress LZH data.
pub fn decode_lzh(data: &[u8], method: LzhMethod, uncompressed_size: u64) -> Result<Vec<u8>> {
    Decoder::from(method).decode(data, uncompressed_size)
}
