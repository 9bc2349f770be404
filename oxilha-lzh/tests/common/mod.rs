//! Test-only LZH block encoder.
//!
//! Produces streams the block decoder accepts: an MSB-first bit writer,
//! Huffman code lengths limited by frequency halving, and canonical code
//! assignment matching the decoder's tree construction.

#![allow(dead_code)]

use oxilha_lzh::DecoderConfig;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Size of the main alphabet.
pub const NUM_CODES: usize = 510;
/// Size of the temp alphabet.
pub const MAX_TEMP_CODES: usize = 20;
/// Longest main code; temp symbol `len + 2` must stay below 20.
const MAX_MAIN_LENGTH: u8 = 16;

/// One LZSS token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Emit one byte.
    Literal(u8),
    /// Repeat `length` bytes starting `distance + 1` bytes back.
    Copy { length: usize, distance: usize },
}

/// MSB-first bit writer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    pub fn write(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Huffman code lengths for `freqs`, no longer than `max_len`.
///
/// Symbols with zero frequency get length 0. A single used symbol gets
/// length 1.
pub fn huffman_lengths(freqs: &[u32], max_len: u8) -> Vec<u8> {
    let mut freqs = freqs.to_vec();
    loop {
        let lengths = unlimited_lengths(&freqs);
        if lengths.iter().all(|&len| len <= max_len) {
            return lengths;
        }
        for freq in freqs.iter_mut().filter(|f| **f > 0) {
            *freq = freq.div_ceil(2);
        }
    }
}

fn unlimited_lengths(freqs: &[u32]) -> Vec<u8> {
    let mut lengths = vec![0u8; freqs.len()];
    let used: Vec<usize> = (0..freqs.len()).filter(|&s| freqs[s] > 0).collect();
    match used.len() {
        0 => return lengths,
        1 => {
            lengths[used[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    // Node ids: leaves first (in `used` order), then merged nodes.
    let mut parent: Vec<Option<usize>> = vec![None; used.len()];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = used
        .iter()
        .enumerate()
        .map(|(id, &sym)| Reverse((u64::from(freqs[sym]), id)))
        .collect();

    while heap.len() > 1 {
        let Reverse((wa, a)) = heap.pop().expect("heap has two nodes");
        let Reverse((wb, b)) = heap.pop().expect("heap has two nodes");
        let id = parent.len();
        parent.push(None);
        parent[a] = Some(id);
        parent[b] = Some(id);
        heap.push(Reverse((wa + wb, id)));
    }

    for (leaf, &sym) in used.iter().enumerate() {
        let mut depth = 0u8;
        let mut node = leaf;
        while let Some(up) = parent[node] {
            depth += 1;
            node = up;
        }
        lengths[sym] = depth;
    }
    lengths
}

/// Canonical codes: shorter lengths first, ascending symbols within a length.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let max = lengths.iter().copied().max().unwrap_or(0);
    let mut codes = vec![0u32; lengths.len()];
    let mut code = 0u32;
    for len in 1..=max {
        for (sym, &l) in lengths.iter().enumerate() {
            if l == len {
                codes[sym] = code;
                code += 1;
            }
        }
        code <<= 1;
    }
    codes
}

/// A Huffman table ready for writing: either one symbol or full lengths.
enum Table {
    Single(u16),
    Codes { lengths: Vec<u8>, codes: Vec<u32> },
}

impl Table {
    fn from_freqs(freqs: &[u32], max_len: u8) -> Self {
        let used: Vec<usize> = (0..freqs.len()).filter(|&s| freqs[s] > 0).collect();
        if used.len() <= 1 {
            return Table::Single(used.first().copied().unwrap_or(0) as u16);
        }
        let lengths = huffman_lengths(freqs, max_len);
        let codes = canonical_codes(&lengths);
        Table::Codes { lengths, codes }
    }

    /// Number of table entries to transmit (trailing zeros dropped).
    fn count(lengths: &[u8]) -> usize {
        lengths.iter().rposition(|&l| l > 0).map_or(0, |i| i + 1)
    }

    fn write_symbol(&self, writer: &mut BitWriter, symbol: usize) {
        match self {
            Table::Single(only) => assert_eq!(symbol, *only as usize),
            Table::Codes { lengths, codes } => {
                assert!(lengths[symbol] > 0, "symbol {symbol} has no code");
                writer.write(codes[symbol], u32::from(lengths[symbol]));
            }
        }
    }
}

/// Offset symbol and extra bits for a distance.
pub fn offset_code(distance: usize) -> (usize, u32, u32) {
    match distance {
        0 => (0, 0, 0),
        1 => (1, 0, 0),
        _ => {
            let width = usize::BITS - distance.leading_zeros();
            let extra_bits = width - 1;
            let extra = (distance - (1 << extra_bits)) as u32;
            (width as usize, extra, extra_bits)
        }
    }
}

/// Writes a stream block by block.
pub struct StreamEncoder {
    config: DecoderConfig,
    writer: BitWriter,
}

impl StreamEncoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            writer: BitWriter::new(),
        }
    }

    /// Largest distance the offset alphabet can express.
    pub fn max_distance(&self) -> usize {
        (1 << (self.config.history_bits - 1)) - 1
    }

    fn write_length(&mut self, len: u8) {
        if len < 7 {
            self.writer.write(u32::from(len), 3);
        } else {
            self.writer.write(7, 3);
            for _ in 7..len {
                self.writer.write_bit(true);
            }
            self.writer.write_bit(false);
        }
    }

    /// Append one block holding `tokens`.
    pub fn write_block(&mut self, tokens: &[Token]) {
        assert!(tokens.len() <= usize::from(u16::MAX));
        let num_offsets = self.config.num_offset_codes();

        let mut main_freqs = vec![0u32; NUM_CODES];
        let mut offset_freqs = vec![0u32; num_offsets];
        for token in tokens {
            match *token {
                Token::Literal(byte) => main_freqs[usize::from(byte)] += 1,
                Token::Copy { length, distance } => {
                    assert!((3..=256).contains(&length));
                    main_freqs[256 + length - 3] += 1;
                    let (symbol, _, _) = offset_code(distance);
                    assert!(symbol < num_offsets, "distance {distance} too far");
                    offset_freqs[symbol] += 1;
                }
            }
        }

        let main = Table::from_freqs(&main_freqs, MAX_MAIN_LENGTH);
        let offsets = Table::from_freqs(&offset_freqs, 16);

        self.writer.write(tokens.len() as u32, 16);
        self.write_code_tables(&main);
        self.write_offset_table(&offsets);

        for token in tokens {
            match *token {
                Token::Literal(byte) => main.write_symbol(&mut self.writer, usize::from(byte)),
                Token::Copy { length, distance } => {
                    main.write_symbol(&mut self.writer, 256 + length - 3);
                    let (symbol, extra, extra_bits) = offset_code(distance);
                    offsets.write_symbol(&mut self.writer, symbol);
                    self.writer.write(extra, extra_bits);
                }
            }
        }
    }

    /// Temp table followed by the main table.
    fn write_code_tables(&mut self, main: &Table) {
        let lengths = match main {
            Table::Codes { lengths, .. } => lengths,
            Table::Single(symbol) => {
                // Temp table unused: single symbol 0.
                self.writer.write(0, 5);
                self.writer.write(0, 5);
                self.writer.write(0, 9);
                self.writer.write(u32::from(*symbol), 9);
                return;
            }
        };

        let n = Table::count(lengths);
        let items = temp_items(&lengths[..n]);

        let mut temp_freqs = vec![0u32; MAX_TEMP_CODES];
        for &(symbol, _, _) in &items {
            temp_freqs[symbol] += 1;
        }
        let temp = Table::from_freqs(&temp_freqs, 16);
        self.write_temp_table(&temp);

        self.writer.write(n as u32, 9);
        for (symbol, extra, extra_bits) in items {
            temp.write_symbol(&mut self.writer, symbol);
            self.writer.write(extra, extra_bits);
        }
    }

    fn write_temp_table(&mut self, temp: &Table) {
        match temp {
            Table::Single(symbol) => {
                self.writer.write(0, 5);
                self.writer.write(u32::from(*symbol), 5);
            }
            Table::Codes { lengths, .. } => {
                let n = Table::count(lengths);
                self.writer.write(n as u32, 5);
                let mut i = 0;
                while i < n {
                    self.write_length(lengths[i]);
                    if i == 2 {
                        let zeros = lengths[3..n.min(6)]
                            .iter()
                            .take_while(|&&l| l == 0)
                            .count();
                        self.writer.write(zeros as u32, 2);
                        i += zeros;
                    }
                    i += 1;
                }
            }
        }
    }

    fn write_offset_table(&mut self, offsets: &Table) {
        let bits = u32::from(self.config.offset_bits);
        match offsets {
            Table::Single(symbol) => {
                self.writer.write(0, bits);
                self.writer.write(u32::from(*symbol), bits);
            }
            Table::Codes { lengths, .. } => {
                let n = Table::count(lengths);
                self.writer.write(n as u32, bits);
                for &len in &lengths[..n] {
                    self.write_length(len);
                }
            }
        }
    }

    /// Raw access for hand-built malformed streams.
    pub fn writer_mut(&mut self) -> &mut BitWriter {
        &mut self.writer
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

/// Temp-alphabet items `(symbol, extra, extra_bits)` encoding main lengths.
fn temp_items(lengths: &[u8]) -> Vec<(usize, u32, u32)> {
    let mut items = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        if lengths[i] > 0 {
            items.push((usize::from(lengths[i]) + 2, 0, 0));
            i += 1;
            continue;
        }

        let run = lengths[i..].iter().take_while(|&&l| l == 0).count();
        let take = if run >= 20 {
            let take = run.min(20 + 511);
            items.push((2, (take - 20) as u32, 9));
            take
        } else if run >= 3 {
            let take = run.min(18);
            items.push((1, (take - 3) as u32, 4));
            take
        } else {
            items.push((0, 0, 0));
            1
        };
        i += take;
    }
    items
}

/// Encode `tokens` with `block_size` tokens per block.
pub fn encode(config: DecoderConfig, tokens: &[Token], block_size: usize) -> Vec<u8> {
    let mut encoder = StreamEncoder::new(config);
    for block in tokens.chunks(block_size) {
        encoder.write_block(block);
    }
    encoder.finish()
}

/// What the decoder must produce for `tokens`, before truncation.
pub fn expand(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        match *token {
            Token::Literal(byte) => out.push(byte),
            Token::Copy { length, distance } => {
                for _ in 0..length {
                    let byte = out
                        .len()
                        .checked_sub(distance + 1)
                        .map_or(0, |src| out[src]);
                    out.push(byte);
                }
            }
        }
    }
    out
}

/// Deterministic token stream expanding to at least `target_len` bytes.
pub fn sample_tokens(seed: u64, target_len: usize, max_distance: usize) -> Vec<Token> {
    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog, ETAOIN SHRDLU.\n";

    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let mut tokens = Vec::new();
    let mut produced = 0usize;
    while produced < target_len {
        let r = next();
        if produced < 16 || r % 10 < 4 {
            let byte = if r % 37 == 0 {
                (next() & 0xFF) as u8
            } else {
                TEXT[next() % TEXT.len()]
            };
            tokens.push(Token::Literal(byte));
            produced += 1;
        } else {
            let length = if r % 53 == 0 {
                3 + next() % 254
            } else {
                3 + next() % 24
            };
            let distance = match next() % 4 {
                0 => next() % 8,
                1 => next() % 256,
                2 => next() % 2048,
                _ => next() % (max_distance + 1),
            };
            tokens.push(Token::Copy { length, distance });
            produced += length;
        }
    }
    tokens
}
