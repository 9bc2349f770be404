//! Bit-precision cursor over an in-memory byte buffer.
//!
//! `BitCursor` reads fields of any width from 1 to 32 bits, whole bytes,
//! multi-byte integers and NUL-terminated strings from a borrowed slice. It
//! is used both for LZH header fields and for the compressed bitstream
//! itself.
//!
//! # Bit Ordering
//!
//! Bits are consumed most-significant-bit first within each byte: bit offset
//! 0 is the MSB of byte 0. This is the order LZH encoders pack their codes in.
//!
//! # Multi-byte Composition
//!
//! `read_u16`/`read_u32` (and the signed variants) read their bytes one at a
//! time through the 8-bit path and then compose them as follows: the byte
//! sequence is reversed when the cursor is in [`Endianness::Little`] mode,
//! then `value |= byte[i] << (8 * i)` is accumulated over it. In
//! [`Endianness::Big`] mode this yields the little-endian value of the bytes
//! (what LZH headers store); in [`Endianness::Little`] mode it yields the
//! big-endian value (what the compressed stream stores).
//!
//! # Example
//!
//! ```
//! use oxilha_core::bitcursor::{BitCursor, Endianness};
//!
//! let data = [0b1011_0101, 0x34, 0x12];
//! let mut cursor = BitCursor::new(&data);
//! assert_eq!(cursor.read_bits(3).unwrap(), 0b101);
//! assert_eq!(cursor.read_bits(5).unwrap(), 0b10101);
//! assert_eq!(cursor.read_u16().unwrap(), 0x1234);
//!
//! let mut stream = BitCursor::with_endianness(&data[1..], Endianness::Little);
//! assert_eq!(stream.read_u16().unwrap(), 0x3412);
//! ```

use crate::error::{OxiLhaError, Result};

/// Multi-byte composition mode of a [`BitCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Bytes are composed in read order, first byte least significant.
    #[default]
    Big,
    /// Bytes are reversed before composition, first byte most significant.
    Little,
}

/// A positional bit reader over a borrowed byte buffer.
///
/// Positions and lengths reported by the cursor are relative to its own
/// origin, so a cursor obtained from [`BitCursor::slice`] starts at 0 even
/// though it shares storage with its parent.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    /// Underlying storage.
    data: &'a [u8],
    /// Absolute bit index of this cursor's position 0.
    origin: u64,
    /// Absolute bit index of the next bit to read.
    position: u64,
    /// Absolute bit index one past the last readable bit.
    end: u64,
    /// Multi-byte composition mode.
    endianness: Endianness,
}

impl<'a> BitCursor<'a> {
    /// Create a cursor over `data` in [`Endianness::Big`] mode.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_endianness(data, Endianness::Big)
    }

    /// Create a cursor over `data` with the given composition mode.
    pub fn with_endianness(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            origin: 0,
            position: 0,
            end: data.len() as u64 * 8,
            endianness,
        }
    }

    /// Create a cursor that exposes only the first `bit_length` bits of
    /// `data`.
    pub fn with_bit_length(
        data: &'a [u8],
        bit_length: u64,
        endianness: Endianness,
    ) -> Result<Self> {
        let total = data.len() as u64 * 8;
        if bit_length > total {
            return Err(OxiLhaError::underrun(bit_length, total, 0));
        }
        Ok(Self {
            data,
            origin: 0,
            position: 0,
            end: bit_length,
            endianness,
        })
    }

    /// Composition mode used for multi-byte reads.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Current bit offset, relative to this cursor's origin.
    pub fn position(&self) -> u64 {
        self.position - self.origin
    }

    /// Move to `bit_offset` (relative to this cursor's origin).
    pub fn set_position(&mut self, bit_offset: u64) -> Result<()> {
        let len = self.len();
        if bit_offset > len {
            return Err(OxiLhaError::underrun(bit_offset, len, self.position()));
        }
        self.position = self.origin + bit_offset;
        Ok(())
    }

    /// Total number of bits visible through this cursor.
    pub fn len(&self) -> u64 {
        self.end - self.origin
    }

    /// Whether the cursor exposes no bits at all.
    pub fn is_empty(&self) -> bool {
        self.end == self.origin
    }

    /// Number of bits left to read.
    pub fn bits_left(&self) -> u64 {
        self.end - self.position
    }

    /// Whether every bit has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.position == self.end
    }

    /// Current position in bytes, rounded up.
    pub fn byte_position(&self) -> u64 {
        self.position().div_ceil(8)
    }

    /// Fail with `StreamUnderrun` unless `bits` more bits are available.
    #[inline]
    fn require(&self, bits: u64) -> Result<()> {
        let available = self.bits_left();
        if bits > available {
            return Err(OxiLhaError::underrun(bits, available, self.position()));
        }
        Ok(())
    }

    /// Read `count` bits (1..=32) as an unsigned integer, MSB first.
    ///
    /// On failure the cursor does not move.
    #[inline]
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count == 0 || count > 32 {
            return Err(OxiLhaError::invalid_bit_count(count));
        }
        self.require(u64::from(count))?;

        let mut value = 0u64;
        let mut remaining = count;
        let mut pos = self.position;

        while remaining > 0 {
            let byte = self.data[(pos >> 3) as usize];
            let bit_offset = (pos & 7) as u32;
            let take = remaining.min(8 - bit_offset);
            let shift = 8 - bit_offset - take;
            let mask = ((1u16 << take) - 1) as u8;

            value = (value << take) | u64::from((byte >> shift) & mask);
            pos += u64::from(take);
            remaining -= take;
        }

        self.position = pos;
        Ok(value as u32)
    }

    /// Read `count` bits (1..=32) and sign-extend from bit `count - 1`.
    pub fn read_bits_signed(&mut self, count: u32) -> Result<i32> {
        let value = self.read_bits(count)?;
        if count < 32 && value & (1 << (count - 1)) != 0 {
            return Ok((value | !((1u32 << count) - 1)) as i32);
        }
        Ok(value as i32)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Skip `count` bits.
    pub fn skip_bits(&mut self, count: u64) -> Result<()> {
        self.require(count)?;
        self.position += count;
        Ok(())
    }

    /// Read an unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_bits(8)? as u8 as i8)
    }

    /// Read `width` whole bytes and compose them per the cursor's mode.
    fn read_composed(&mut self, width: usize) -> Result<u32> {
        self.require(width as u64 * 8)?;

        let mut buf = [0u8; 4];
        for byte in buf.iter_mut().take(width) {
            *byte = self.read_u8()?;
        }

        let bytes = &mut buf[..width];
        if self.endianness == Endianness::Little {
            bytes.reverse();
        }

        Ok(bytes
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i))))
    }

    /// Read a 16-bit unsigned integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_composed(2)? as u16)
    }

    /// Read a 16-bit signed integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_composed(2)? as u16 as i16)
    }

    /// Read a 32-bit unsigned integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_composed(4)
    }

    /// Read a 32-bit signed integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_composed(4)? as i32)
    }

    /// Read `byte_length` bytes into a freshly allocated buffer.
    ///
    /// The cursor does not need to be byte aligned.
    pub fn read_bytes(&mut self, byte_length: usize) -> Result<Vec<u8>> {
        self.require(byte_length as u64 * 8)?;

        if self.position % 8 == 0 {
            let start = (self.position / 8) as usize;
            let bytes = self.data[start..start + byte_length].to_vec();
            self.position += byte_length as u64 * 8;
            return Ok(bytes);
        }

        let mut bytes = Vec::with_capacity(byte_length);
        for _ in 0..byte_length {
            bytes.push(self.read_u8()?);
        }
        Ok(bytes)
    }

    /// Read a NUL-terminated byte string.
    ///
    /// With `Some(n)`, exactly `n` bytes are consumed and bytes stop being
    /// collected at the first NUL. With `None`, bytes are read up to and
    /// including the first NUL, or to the end of the cursor.
    pub fn read_string_bytes(&mut self, byte_length: Option<usize>) -> Result<Vec<u8>> {
        match byte_length {
            Some(0) => Ok(Vec::new()),
            Some(n) => {
                self.require(n as u64 * 8)?;
                let mut bytes = Vec::with_capacity(n);
                let mut append = true;
                for _ in 0..n {
                    let c = self.read_u8()?;
                    if c == 0 {
                        append = false;
                    }
                    if append {
                        bytes.push(c);
                    }
                }
                Ok(bytes)
            }
            None => {
                let limit = self.bits_left() / 8;
                let mut bytes = Vec::new();
                for _ in 0..limit {
                    let c = self.read_u8()?;
                    if c == 0 {
                        break;
                    }
                    bytes.push(c);
                }
                Ok(bytes)
            }
        }
    }

    /// Read a NUL-terminated string, mapping every byte to the char with the
    /// same code point. See [`BitCursor::read_string_bytes`] for the length
    /// rules.
    pub fn read_ascii_string(&mut self, byte_length: Option<usize>) -> Result<String> {
        Ok(self
            .read_string_bytes(byte_length)?
            .into_iter()
            .map(char::from)
            .collect())
    }

    /// Peek at the byte `bytes_ahead` bytes past the current position without
    /// moving the cursor.
    pub fn peek_u8(&self, bytes_ahead: u64) -> Result<u8> {
        let mut probe = self.clone();
        probe.skip_bits(bytes_ahead * 8)?;
        probe.read_u8()
    }

    /// Carve out the next `bit_length` bits as an independent cursor.
    ///
    /// The child shares this cursor's storage and composition mode, starts
    /// at position 0 and ends after `bit_length` bits. This cursor advances
    /// past the carved range.
    pub fn slice(&mut self, bit_length: u64) -> Result<BitCursor<'a>> {
        self.require(bit_length)?;

        let child = BitCursor {
            data: self.data,
            origin: self.position,
            position: self.position,
            end: self.position + bit_length,
            endianness: self.endianness,
        };
        self.position += bit_length;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_msb_first() {
        // 0b10110101 = 0xB5
        let data = [0xB5];
        let mut cursor = BitCursor::new(&data);

        let expected = [1, 0, 1, 1, 0, 1, 0, 1];
        for bit in expected {
            assert_eq!(cursor.read_bits(1).unwrap(), bit);
        }
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_read_bits_crosses_bytes() {
        let data = [0xFF, 0x00, 0xA5];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_bits(4).unwrap(), 0xF);
        assert_eq!(cursor.read_bits(8).unwrap(), 0xF0);
        assert_eq!(cursor.read_bits(12).unwrap(), 0x0A5);
        assert_eq!(cursor.bits_left(), 0);
    }

    #[test]
    fn test_read_32_bits_unaligned() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut cursor = BitCursor::new(&data);

        cursor.read_bits(4).unwrap();
        assert_eq!(cursor.read_bits(32).unwrap(), 0x2345_6789);
    }

    #[test]
    fn test_read_bits_signed() {
        let data = [0b1110_0000];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_bits_signed(3).unwrap(), -1);

        let data = [0b0110_0000];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_bits_signed(3).unwrap(), 3);

        let data = [0xFF, 0xFF, 0xFF, 0xFE];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_bits_signed(32).unwrap(), -2);
    }

    #[test]
    fn test_invalid_bit_count() {
        let data = [0u8; 8];
        let mut cursor = BitCursor::new(&data);
        assert!(matches!(
            cursor.read_bits(0),
            Err(OxiLhaError::InvalidBitCount { count: 0 })
        ));
        assert!(matches!(
            cursor.read_bits(33),
            Err(OxiLhaError::InvalidBitCount { count: 33 })
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_underrun_leaves_position() {
        let data = [0xAB];
        let mut cursor = BitCursor::new(&data);
        cursor.read_bits(5).unwrap();

        let err = cursor.read_bits(4).unwrap_err();
        assert!(matches!(
            err,
            OxiLhaError::StreamUnderrun {
                requested: 4,
                available: 3,
                position: 5
            }
        ));
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.read_bits(3).unwrap(), 0b011);
    }

    #[test]
    fn test_multi_byte_big_mode() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_multi_byte_little_mode() {
        let data = [0x12, 0x34, 0x12, 0x34, 0x56, 0x78];
        let mut cursor = BitCursor::with_endianness(&data, Endianness::Little);

        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_multi_byte_unaligned() {
        // Nibble-shifted 0x34 0x12
        let data = [0x03, 0x41, 0x20];
        let mut cursor = BitCursor::new(&data);
        cursor.read_bits(4).unwrap();
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn test_signed_multi_byte() {
        let data = [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_i32().unwrap(), 0x7FFF_FFFF);

        let data = [0x80];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_i8().unwrap(), -128);
    }

    #[test]
    fn test_read_bytes() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.read_bytes(2).unwrap(), vec![0x12, 0x34]);
        assert_eq!(cursor.position(), 16);
        assert_eq!(cursor.read_bytes(2).unwrap(), vec![0x56, 0x78]);
        assert!(cursor.read_bytes(1).is_err());
    }

    #[test]
    fn test_read_bytes_unaligned() {
        let data = [0x01, 0x23, 0x40];
        let mut cursor = BitCursor::new(&data);
        cursor.read_bits(4).unwrap();
        assert_eq!(cursor.read_bytes(2).unwrap(), vec![0x12, 0x34]);
    }

    #[test]
    fn test_ascii_string_fixed_length() {
        let data = b"AB\0CDxyz";
        let mut cursor = BitCursor::new(data);

        assert_eq!(cursor.read_ascii_string(Some(5)).unwrap(), "AB");
        assert_eq!(cursor.position(), 40);
        assert_eq!(cursor.read_ascii_string(Some(0)).unwrap(), "");
        assert_eq!(cursor.read_ascii_string(Some(3)).unwrap(), "xyz");
    }

    #[test]
    fn test_ascii_string_unbounded() {
        let data = b"hello\0world";
        let mut cursor = BitCursor::new(data);

        assert_eq!(cursor.read_ascii_string(None).unwrap(), "hello");
        assert_eq!(cursor.position(), 48);
        assert_eq!(cursor.read_ascii_string(None).unwrap(), "world");
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_ascii_string_high_bytes() {
        let data = [0x41, 0xE9];
        let mut cursor = BitCursor::new(&data);
        assert_eq!(cursor.read_ascii_string(Some(2)).unwrap(), "A\u{e9}");
    }

    #[test]
    fn test_slice_shares_storage() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut parent = BitCursor::new(&data);
        parent.read_u8().unwrap();

        let mut child = parent.slice(16).unwrap();
        assert_eq!(parent.position(), 24);
        assert_eq!(child.position(), 0);
        assert_eq!(child.len(), 16);
        assert_eq!(child.read_u8().unwrap(), 0xBB);
        assert_eq!(child.read_u8().unwrap(), 0xCC);
        assert!(child.read_bits(1).is_err());

        assert_eq!(parent.read_u8().unwrap(), 0xDD);
    }

    #[test]
    fn test_slice_past_end_fails() {
        let data = [0u8; 2];
        let mut cursor = BitCursor::new(&data);
        assert!(cursor.slice(17).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_slice_inherits_endianness() {
        let data = [0x12, 0x34];
        let mut parent = BitCursor::with_endianness(&data, Endianness::Little);
        let mut child = parent.slice(16).unwrap();
        assert_eq!(child.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn test_peek_and_positioning() {
        let data = [1, 2, 3, 4];
        let mut cursor = BitCursor::new(&data);

        assert_eq!(cursor.peek_u8(2).unwrap(), 3);
        assert_eq!(cursor.position(), 0);
        assert!(cursor.peek_u8(4).is_err());

        cursor.read_bits(3).unwrap();
        assert_eq!(cursor.byte_position(), 1);
        cursor.set_position(24).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 4);
        assert!(cursor.set_position(33).is_err());
    }

    #[test]
    fn test_with_bit_length() {
        let data = [0xFF, 0xFF];
        let mut cursor = BitCursor::with_bit_length(&data, 10, Endianness::Big).unwrap();
        assert_eq!(cursor.read_bits(10).unwrap(), 0x3FF);
        assert!(cursor.read_bit().is_err());

        assert!(BitCursor::with_bit_length(&data, 17, Endianness::Big).is_err());
    }
}
