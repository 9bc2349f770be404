//! Block decoder for the LZSS + static Huffman methods (lh4 to lh7).
//!
//! A compressed stream is a sequence of blocks. Each block starts with a
//! 16-bit count of main-alphabet symbols, followed by three Huffman tables:
//!
//! 1. the temp table, whose symbols describe the main table's code lengths;
//! 2. the main table (literals 0-255, copy lengths 256-509);
//! 3. the offset table, whose symbols give the bit width of a copy distance.
//!
//! The history window persists across blocks of one entry.

use crate::decode::DecodeOptions;
use crate::huffman::HuffmanTree;
use crate::methods::DecoderConfig;
use crate::methods::constants::{
    CODE_COUNT_BITS, MAX_TEMP_CODES, NUM_CODES, TEMP_COUNT_BITS,
};
use oxilha_core::bitcursor::{BitCursor, Endianness};
use oxilha_core::error::{OxiLhaError, Result};
use oxilha_core::ringbuffer::RingBuffer;
use tracing::{debug, trace};

/// Initial output reservation per compressed input byte; the buffer grows past it on demand.
const RESERVE_PER_INPUT_BYTE: usize = 64;

/// Number of steps between cancellation checks inside a block.
const CANCEL_POLL_INTERVAL: u64 = 4096;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// The next step reads a block header and its tables.
    NeedBlock,
    /// Symbols of the current block remain.
    InBlock,
    /// The declared output size has been reached.
    Done,
    /// A read or table error occurred; no further steps are possible.
    Failed,
}

/// Incremental decoder over one compressed entry.
#[derive(Debug)]
pub struct BlockDecoder<'a> {
    config: DecoderConfig,
    cursor: BitCursor<'a>,
    ring: RingBuffer,
    temp_tree: HuffmanTree,
    code_tree: HuffmanTree,
    offset_tree: HuffmanTree,
    /// Main symbols left in the current block.
    block_remaining: u16,
    state: DecoderState,
    output: Vec<u8>,
    expected_len: usize,
    blocks_read: u64,
}

impl<'a> BlockDecoder<'a> {
    /// Create a decoder over `data` that stops after `expected_len` bytes.
    pub fn new(config: DecoderConfig, data: &'a [u8], expected_len: usize) -> Self {
        let state = if expected_len == 0 {
            DecoderState::Done
        } else {
            DecoderState::NeedBlock
        };

        Self {
            config,
            cursor: BitCursor::with_endianness(data, Endianness::Little),
            ring: RingBuffer::new(config.history_bits),
            temp_tree: HuffmanTree::for_alphabet(MAX_TEMP_CODES),
            code_tree: HuffmanTree::for_alphabet(NUM_CODES),
            offset_tree: HuffmanTree::new(config.offset_tree_capacity()),
            block_remaining: 0,
            state,
            output: Vec::with_capacity(
                expected_len.min(data.len().saturating_mul(RESERVE_PER_INPUT_BYTE)),
            ),
            expected_len,
            blocks_read: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes produced so far (may exceed the declared size by one copy).
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Number of block headers read.
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Bit position in the compressed stream.
    pub fn bit_position(&self) -> u64 {
        self.cursor.position()
    }

    /// Run one transition of the state machine.
    ///
    /// Any error moves the decoder to [`DecoderState::Failed`]; stepping a
    /// failed or finished decoder is a no-op returning its state.
    pub fn step(&mut self) -> Result<DecoderState> {
        let result = match self.state {
            DecoderState::Done | DecoderState::Failed => return Ok(self.state),
            DecoderState::NeedBlock => self.start_new_block(),
            DecoderState::InBlock => self.decode_symbol(),
        };

        match result {
            Ok(()) => {
                if self.output.len() >= self.expected_len {
                    self.state = DecoderState::Done;
                }
                Ok(self.state)
            }
            Err(err) => {
                self.state = DecoderState::Failed;
                Err(err)
            }
        }
    }

    /// Step until done, then return exactly `expected_len` bytes.
    pub fn decode(mut self, options: &DecodeOptions) -> Result<Vec<u8>> {
        let mut steps = 0u64;

        loop {
            let at_boundary = self.state == DecoderState::NeedBlock;
            if (at_boundary || steps % CANCEL_POLL_INTERVAL == 0) && options.is_cancelled() {
                debug!(
                    produced = self.output.len(),
                    blocks = self.blocks_read,
                    "decode cancelled"
                );
                self.state = DecoderState::Failed;
                return Err(OxiLhaError::Cancelled);
            }

            match self.step()? {
                DecoderState::Done | DecoderState::Failed => break,
                DecoderState::NeedBlock | DecoderState::InBlock => {}
            }
            steps += 1;
        }

        self.output.truncate(self.expected_len);
        debug!(
            bytes = self.output.len(),
            blocks = self.blocks_read,
            bits_consumed = self.cursor.position(),
            "block decode finished"
        );
        Ok(self.output)
    }

    /// Read a block header and rebuild all three tables.
    fn start_new_block(&mut self) -> Result<()> {
        // Unsigned: counts of 0x8000 and above are valid, never a failure.
        let count = self.cursor.read_u16()?;
        self.blocks_read += 1;
        debug!(
            block = self.blocks_read,
            codes = count,
            bit_position = self.cursor.position(),
            "starting block"
        );

        self.read_temp_table()?;
        self.read_code_table()?;
        self.read_offset_table()?;

        self.block_remaining = count;
        if count > 0 {
            self.state = DecoderState::InBlock;
        }
        Ok(())
    }

    /// Decode one main symbol and emit a literal or a copy.
    fn decode_symbol(&mut self) -> Result<()> {
        let code = self.code_tree.read(&mut self.cursor)?;

        if code < 256 {
            let byte = code as u8;
            self.output.push(byte);
            self.ring.write_byte(byte);
        } else {
            let length = code as usize - 256 + self.config.copy_threshold();
            let distance = self.read_offset_code()?;
            self.ring
                .copy_from_history(distance, length, &mut self.output)?;
        }

        self.block_remaining -= 1;
        if self.block_remaining == 0 {
            self.state = DecoderState::NeedBlock;
        }
        Ok(())
    }

    /// Read a code length: 3 bits, with 7 extended by a run of 1-bits.
    fn read_length(&mut self) -> Result<u8> {
        let mut length = self.cursor.read_bits(3)? as u8;
        if length == 7 {
            while self.cursor.read_bit()? {
                length = length.checked_add(1).ok_or_else(|| {
                    OxiLhaError::invalid_huffman("code length overflows 255")
                })?;
            }
        }
        Ok(length)
    }

    /// Read the temp table used to decode main-table lengths.
    fn read_temp_table(&mut self) -> Result<()> {
        let n = self.cursor.read_bits(TEMP_COUNT_BITS)? as usize;
        if n == 0 {
            let code = self.cursor.read_bits(TEMP_COUNT_BITS)?;
            self.temp_tree.set_single(code as u16);
            trace!(symbol = code, "temp table is a single symbol");
            return Ok(());
        }

        let n = n.min(MAX_TEMP_CODES);
        let mut lengths = [0u8; MAX_TEMP_CODES];
        let mut i = 0;
        while i < n {
            lengths[i] = self.read_length()?;
            if i == 2 {
                // Up to three zero lengths follow index 2; `lengths` is
                // already zeroed, so only the index moves.
                i += self.cursor.read_bits(2)? as usize;
            }
            i += 1;
        }

        trace!(codes = n, "temp table");
        self.temp_tree.build(&lengths[..n])
    }

    /// Read the main literal/length table.
    fn read_code_table(&mut self) -> Result<()> {
        let n = self.cursor.read_bits(CODE_COUNT_BITS)? as usize;
        if n == 0 {
            let code = self.cursor.read_bits(CODE_COUNT_BITS)?;
            self.code_tree.set_single(code as u16);
            trace!(symbol = code, "code table is a single symbol");
            return Ok(());
        }

        let n = n.min(NUM_CODES);
        let mut lengths = [0u8; NUM_CODES];
        let mut i = 0;
        while i < n {
            let code = self.temp_tree.read(&mut self.cursor)?;
            if code <= 2 {
                let skip = match code {
                    0 => 1,
                    1 => self.cursor.read_bits(4)? as usize + 3,
                    _ => self.cursor.read_bits(9)? as usize + 20,
                };
                // Zero run; clamped to the table.
                i = (i + skip).min(n);
            } else {
                lengths[i] = u8::try_from(code - 2).map_err(|_| {
                    OxiLhaError::invalid_huffman(format!("temp symbol {code} out of range"))
                })?;
                i += 1;
            }
        }

        trace!(codes = n, "code table");
        self.code_tree.build(&lengths[..n])
    }

    /// Read the offset (distance bit-width) table.
    fn read_offset_table(&mut self) -> Result<()> {
        let bits = u32::from(self.config.offset_bits);
        let n = self.cursor.read_bits(bits)? as usize;
        if n == 0 {
            let code = self.cursor.read_bits(bits)?;
            self.offset_tree.set_single(code as u16);
            trace!(symbol = code, "offset table is a single symbol");
            return Ok(());
        }

        let n = n.min(self.config.num_offset_codes());
        let mut lengths = vec![0u8; n];
        for length in lengths.iter_mut() {
            *length = self.read_length()?;
        }

        trace!(codes = n, "offset table");
        self.offset_tree.build(&lengths)
    }

    /// Decode a copy distance (0 is the last byte written).
    fn read_offset_code(&mut self) -> Result<usize> {
        let bits = self.offset_tree.read(&mut self.cursor)?;
        match bits {
            0 => Ok(0),
            1 => Ok(1),
            _ => {
                let extra_bits = u32::from(bits - 1);
                if extra_bits > 31 {
                    return Err(OxiLhaError::invalid_huffman(format!(
                        "offset code {bits} too wide"
                    )));
                }
                let extra = self.cursor.read_bits(extra_bits)? as usize;
                Ok(extra + (1usize << extra_bits))
            }
        }
    }
}
