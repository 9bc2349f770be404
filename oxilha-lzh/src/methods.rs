//! LZH compression method definitions.
//!
//! Every method id found in an LHA header maps to one of two strategies: the
//! stored passthrough (`-lh0-`) or the block decoder parameterised by a
//! history window size and the width of the offset-table count field.

/// LZH compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LzhMethod {
    /// lh0: Stored (no compression).
    Lh0,
    /// lh4: 4KB window, static Huffman.
    Lh4,
    /// lh5: 16KB window, static Huffman (most common).
    #[default]
    Lh5,
    /// lh6: 64KB window, static Huffman.
    Lh6,
    /// lh7: 128KB window, static Huffman.
    Lh7,
}

impl LzhMethod {
    /// All methods this crate can decode.
    pub const ALL: [LzhMethod; 5] = [Self::Lh0, Self::Lh4, Self::Lh5, Self::Lh6, Self::Lh7];

    /// Parse method from the 5-byte method ID string.
    pub fn from_id(id: &[u8]) -> Option<Self> {
        match id {
            b"-lh0-" => Some(Self::Lh0),
            b"-lh4-" => Some(Self::Lh4),
            b"-lh5-" => Some(Self::Lh5),
            b"-lh6-" => Some(Self::Lh6),
            b"-lh7-" => Some(Self::Lh7),
            _ => None,
        }
    }

    /// Get the method ID string.
    pub fn id(&self) -> &'static [u8; 5] {
        match self {
            Self::Lh0 => b"-lh0-",
            Self::Lh4 => b"-lh4-",
            Self::Lh5 => b"-lh5-",
            Self::Lh6 => b"-lh6-",
            Self::Lh7 => b"-lh7-",
        }
    }

    /// Block decoder parameters, or `None` for the stored method.
    pub fn decoder_config(&self) -> Option<DecoderConfig> {
        match self {
            Self::Lh0 => None,
            Self::Lh4 => Some(DecoderConfig::new(12, 4)),
            Self::Lh5 => Some(DecoderConfig::new(14, 4)),
            Self::Lh6 => Some(DecoderConfig::new(16, 5)),
            Self::Lh7 => Some(DecoderConfig::new(17, 5)),
        }
    }

    /// Get the sliding window size in bytes.
    pub fn window_size(&self) -> usize {
        self.decoder_config()
            .map_or(0, |config| config.ring_buffer_size())
    }

    /// Check if this method is stored (no compression).
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Lh0)
    }

    /// Get the method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lh0 => "lh0",
            Self::Lh4 => "lh4",
            Self::Lh5 => "lh5",
            Self::Lh6 => "lh6",
            Self::Lh7 => "lh7",
        }
    }
}

impl std::fmt::Display for LzhMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parameters of the block decoder for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderConfig {
    /// log2 of the history window size; also the size of the offset alphabet.
    pub history_bits: u8,
    /// Width of the offset-table count field.
    pub offset_bits: u8,
}

impl DecoderConfig {
    /// Create a configuration.
    pub const fn new(history_bits: u8, offset_bits: u8) -> Self {
        Self {
            history_bits,
            offset_bits,
        }
    }

    /// Shortest back-reference; main symbol 256 encodes this length.
    pub const fn copy_threshold(&self) -> usize {
        constants::COPY_THRESHOLD
    }

    /// History window size in bytes.
    pub const fn ring_buffer_size(&self) -> usize {
        1 << self.history_bits
    }

    /// Number of symbols in the offset alphabet.
    pub const fn num_offset_codes(&self) -> usize {
        self.history_bits as usize
    }

    /// Arena size for the offset tree.
    pub fn offset_tree_capacity(&self) -> usize {
        2 * self.num_offset_codes().max(constants::MAX_TEMP_CODES)
    }
}

/// LZH constants for decoding.
pub mod constants {
    /// Size of the main alphabet (256 literals + 254 copy lengths).
    pub const NUM_CODES: usize = 510;
    /// Size of the temporary (code-length) alphabet.
    pub const MAX_TEMP_CODES: usize = 20;
    /// Minimum copy length.
    pub const COPY_THRESHOLD: usize = 3;
    /// Width of the temp-table count field.
    pub const TEMP_COUNT_BITS: u32 = 5;
    /// Width of the main-table count field.
    pub const CODE_COUNT_BITS: u32 = 9;
}
