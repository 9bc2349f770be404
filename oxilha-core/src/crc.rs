//! CRC-16 as stored in LZH/LHA headers.
//!
//! LHA archives record a CRC-16/ARC of every entry's uncompressed contents
//! (polynomial 0x8005, reflected as 0xA001, initial value 0, no final XOR).

use crate::error::{OxiLhaError, Result};

/// Reflected CRC-16/ARC lookup table.
const TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xA001
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Incremental CRC-16/ARC calculator.
///
/// ```
/// use oxilha_core::crc::Crc16;
///
/// let mut crc = Crc16::new();
/// crc.update(b"12345");
/// crc.update(b"6789");
/// assert_eq!(crc.value(), 0xBB3D);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16(u16);

impl Crc16 {
    /// Start a new checksum.
    pub fn new() -> Self {
        Self(0)
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.0 = data.iter().fold(self.0, |crc, &byte| {
            TABLE[usize::from((crc ^ u16::from(byte)) & 0xFF)] ^ (crc >> 8)
        });
    }

    /// Current checksum value.
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Checksum of `data` in one call.
    pub fn compute(data: &[u8]) -> u16 {
        let mut crc = Self::new();
        crc.update(data);
        crc.value()
    }

    /// Check `data` against the CRC recorded in a header.
    pub fn verify(data: &[u8], expected: u16) -> Result<()> {
        let computed = Self::compute(data);
        if computed != expected {
            return Err(OxiLhaError::crc_mismatch(expected, computed));
        }
        Ok(())
    }
}
