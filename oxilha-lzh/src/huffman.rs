//! LZH Huffman decode tree.
//!
//! The tree lives in a fixed-size arena. Slot 0 is the root; every slot is
//! either a leaf carrying a symbol or an internal node holding the index of
//! its left child (the right child sits directly after it). Decoding walks
//! from the root, consuming one bit per internal node.
//!
//! Trees are rebuilt from a list of code lengths at the start of every block.
//! Codes are canonical: shorter codes come first and, within a length,
//! symbols are placed in ascending order.

use oxilha_core::BitCursor;
use oxilha_core::error::{OxiLhaError, Result};
use tracing::trace;

/// One arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Terminal slot carrying a decoded symbol.
    Leaf(u16),
    /// Internal node; the children live at `left` and `left + 1`.
    Node(usize),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Leaf(0)
    }
}

/// Huffman decode tree over an arena of `capacity` slots.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    slots: Vec<Slot>,
}

/// Bookkeeping for a single `build` pass.
struct BuildState {
    /// First slot not yet expanded or filled.
    next_free: usize,
    /// Number of slots handed out so far.
    allocated: usize,
}

impl BuildState {
    /// Turn every pending slot into a node with two fresh children.
    ///
    /// Skipped entirely when the arena cannot hold the new children.
    fn expand(&mut self, slots: &mut [Slot]) {
        let new_slots = (self.allocated - self.next_free) * 2;
        if self.allocated + new_slots > slots.len() {
            return;
        }

        let end = self.allocated;
        while self.next_free < end {
            slots[self.next_free] = Slot::Node(self.allocated);
            self.allocated += 2;
            self.next_free += 1;
        }
    }

    /// Claim the next pending slot for a leaf.
    fn claim(&mut self) -> Option<usize> {
        if self.next_free >= self.allocated {
            return None;
        }
        let slot = self.next_free;
        self.next_free += 1;
        Some(slot)
    }
}

impl HuffmanTree {
    /// Create a tree with room for `capacity` slots.
    ///
    /// A fresh tree decodes symbol 0 without consuming any bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity.max(1)],
        }
    }

    /// Create a tree sized for an alphabet of `alphabet_size` symbols.
    pub fn for_alphabet(alphabet_size: usize) -> Self {
        Self::new(alphabet_size * 2)
    }

    /// Number of arena slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Make the root a leaf for `symbol`, so every read yields it.
    pub fn set_single(&mut self, symbol: u16) {
        self.slots[0] = Slot::Leaf(symbol);
    }

    /// Decode one symbol.
    ///
    /// Running out of input before a leaf is an invalid table, not an underrun.
    pub fn read(&self, cursor: &mut BitCursor<'_>) -> Result<u16> {
        let mut slot = self.slots[0];
        // Each step descends one level; a walk longer than the arena loops.
        for _ in 0..=self.slots.len() {
            match slot {
                Slot::Leaf(symbol) => return Ok(symbol),
                Slot::Node(left) => {
                    let bit = cursor.read_bits(1).map_err(|e| match e {
                        OxiLhaError::StreamUnderrun { position, .. } => {
                            OxiLhaError::invalid_huffman(format!(
                                "input exhausted at bit {position} before reaching a leaf"
                            ))
                        }
                        other => other,
                    })?;
                    let index = left + bit as usize;
                    slot = *self.slots.get(index).ok_or_else(|| {
                        OxiLhaError::invalid_huffman(format!(
                            "child index {index} outside tree of {} slots",
                            self.slots.len()
                        ))
                    })?;
                }
            }
        }

        Err(OxiLhaError::invalid_huffman(
            "traversal deeper than the tree",
        ))
    }

    /// Rebuild the tree from per-symbol code lengths (0 means absent).
    pub fn build(&mut self, code_lengths: &[u8]) -> Result<()> {
        self.slots.fill(Slot::default());

        let mut state = BuildState {
            next_free: 0,
            allocated: 1,
        };
        let mut code_len = 0u8;

        loop {
            state.expand(&mut self.slots);
            code_len += 1;

            let mut longer_remaining = false;
            for (symbol, &len) in code_lengths.iter().enumerate() {
                if len == code_len {
                    let slot = state.claim().ok_or_else(|| {
                        OxiLhaError::invalid_huffman(format!(
                            "no free slot for symbol {symbol} at length {code_len}"
                        ))
                    })?;
                    self.slots[slot] = Slot::Leaf(symbol as u16);
                } else if len > code_len {
                    longer_remaining = true;
                }
            }

            if !longer_remaining {
                break;
            }
        }

        trace!(
            symbols = code_lengths.len(),
            max_length = code_len,
            slots_used = state.allocated,
            "built huffman tree"
        );

        Ok(())
    }
}
