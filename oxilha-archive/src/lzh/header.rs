//! LZH header parsing for header levels 0 and 1.
//!
//! ```text
//! Offset   Length   Contents
//!   0      1 byte   Header size (h), excluding these first two bytes
//!   1      1 byte   Header checksum (byte sum of offsets 2..h+2)
//!   2      5 bytes  Method ID
//!   7      4 bytes  Packed size
//!  11      4 bytes  Original size
//!  15      4 bytes  Timestamp (MS-DOS date/time)
//!  19      1 byte   Attribute
//!  20      1 byte   Level
//!  21      1 byte   Filename length (f)
//!  22      f bytes  Filename
//!  22+f    2 bytes  CRC-16 of the original data
//! level 1 only:
//!  24+f    1 byte   OS ID
//!  h       2 bytes  First extension header size (0 = none)
//!          { type u8 | body (size - 3) | next size u16 }*
//! ```
//!
//! All multi-byte fields are little-endian, which is what a
//! [`Endianness::Big`] cursor composes.

use encoding_rs::SHIFT_JIS;
use oxilha_core::bitcursor::{BitCursor, Endianness};
use oxilha_core::error::{OxiLhaError, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{trace, warn};

/// Byte offset of the level field inside every header.
pub const LEVEL_OFFSET: u64 = 20;

/// Method id LHA uses for directory entries.
pub const DIRECTORY_METHOD: &[u8; 5] = b"-lhd-";

/// Extension header types.
mod ext {
    /// Filename.
    pub const FILENAME: u8 = 0x01;
    /// Directory name; components separated by 0xFF.
    pub const DIRECTORY: u8 = 0x02;
}

/// Parsed LZH entry header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzhHeader {
    /// Header size byte.
    pub header_size: u8,
    /// Header checksum byte.
    pub checksum: u8,
    /// Raw method id, e.g. `-lh5-`.
    pub method_id: [u8; 5],
    /// Packed size as stored (level 1 includes extension headers).
    pub packed_size: u32,
    /// Original (uncompressed) size.
    pub original_size: u32,
    /// MS-DOS timestamp (date in the high word).
    pub timestamp: u32,
    /// File attribute.
    pub attribute: u8,
    /// Header level (0 or 1).
    pub level: u8,
    /// Path with `/` separators.
    pub filename: String,
    /// CRC-16 of the original data.
    pub crc16: u16,
    /// OS identifier (level 1).
    pub os_id: Option<u8>,
    /// Total bytes of level-1 extension headers.
    pub extension_size: u64,
}

impl LzhHeader {
    /// Parse the header at the cursor.
    ///
    /// Returns `Ok(None)` at the end-of-archive marker (a zero size byte) or
    /// when no bytes remain.
    pub fn parse(cursor: &mut BitCursor<'_>) -> Result<Option<Self>> {
        if cursor.bits_left() < 8 {
            return Ok(None);
        }
        let header_size = cursor.peek_u8(0)?;
        if header_size == 0 {
            return Ok(None);
        }

        let start = cursor.position();
        Self::parse_at(cursor).map(Some).map_err(|err| match err {
            OxiLhaError::StreamUnderrun { .. } => OxiLhaError::invalid_header(format!(
                "truncated header at byte {}",
                start / 8
            )),
            other => other,
        })
    }

    fn parse_at(cursor: &mut BitCursor<'_>) -> Result<Self> {
        debug_assert_eq!(cursor.endianness(), Endianness::Big);
        let start = cursor.position();

        let level = cursor.peek_u8(LEVEL_OFFSET)?;
        if level > 1 {
            return Err(OxiLhaError::invalid_header(format!(
                "unsupported header level {level}"
            )));
        }

        let header_size = cursor.read_u8()?;
        let checksum = cursor.read_u8()?;
        verify_checksum(cursor, header_size, checksum)?;

        let method_bytes = cursor.read_bytes(5)?;
        let mut method_id = [0u8; 5];
        method_id.copy_from_slice(&method_bytes);

        let packed_size = cursor.read_u32()?;
        let original_size = cursor.read_u32()?;
        let timestamp = cursor.read_u32()?;
        let attribute = cursor.read_u8()?;
        let level = cursor.read_u8()?;
        let name_len = cursor.read_u8()?;
        let name_bytes = cursor.read_bytes(usize::from(name_len))?;
        let crc16 = cursor.read_u16()?;

        let mut filename = decode_filename(&name_bytes);
        let mut os_id = None;
        let mut extension_size = 0u64;

        // End of the base header, relative to the cursor origin.
        let base_end = start + (u64::from(header_size) + 2) * 8;

        if level == 0 {
            skip_to(cursor, base_end)?;
        } else {
            os_id = Some(cursor.read_u8()?);
            skip_to(cursor, base_end - 16)?;

            let mut directory = None;
            let mut next = cursor.read_u16()?;
            while next > 0 {
                if next < 3 {
                    return Err(OxiLhaError::invalid_header(format!(
                        "extension header size {next} is too small"
                    )));
                }
                extension_size += u64::from(next);

                let ext_type = cursor.read_u8()?;
                let body = cursor.read_bytes(usize::from(next) - 3)?;
                trace!(ext_type, len = body.len(), "extension header");
                match ext_type {
                    ext::FILENAME => filename = decode_filename(&body),
                    ext::DIRECTORY => directory = Some(decode_directory(&body)),
                    _ => {}
                }
                next = cursor.read_u16()?;
            }

            if let Some(dir) = directory.filter(|d| !d.is_empty()) {
                filename = format!("{dir}{filename}");
            }

            if extension_size > u64::from(packed_size) {
                return Err(OxiLhaError::invalid_header(format!(
                    "extension headers ({extension_size} bytes) exceed packed size {packed_size}"
                )));
            }
        }

        Ok(Self {
            header_size,
            checksum,
            method_id,
            packed_size,
            original_size,
            timestamp,
            attribute,
            level,
            filename,
            crc16,
            os_id,
            extension_size,
        })
    }

    /// Number of compressed payload bytes following the header.
    pub fn payload_size(&self) -> u64 {
        u64::from(self.packed_size) - self.extension_size
    }

    /// Method id as text.
    pub fn method_name(&self) -> String {
        String::from_utf8_lossy(&self.method_id).into_owned()
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        &self.method_id == DIRECTORY_METHOD || self.filename.ends_with('/')
    }

    /// Modification time, if the timestamp is a valid DOS date/time.
    pub fn modified(&self) -> Option<SystemTime> {
        dos_datetime_to_systime((self.timestamp >> 16) as u16, self.timestamp as u16)
    }
}

/// Check the header checksum without moving the cursor.
fn verify_checksum(cursor: &BitCursor<'_>, header_size: u8, expected: u8) -> Result<()> {
    let mut probe = cursor.clone();
    let body = probe.read_bytes(usize::from(header_size))?;
    let computed = body.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
    if computed != expected {
        warn!(expected, computed, "header checksum mismatch");
        return Err(OxiLhaError::invalid_header(format!(
            "header checksum mismatch: expected {expected:#04x}, computed {computed:#04x}"
        )));
    }
    Ok(())
}

/// Advance to `position`, refusing to move backwards.
fn skip_to(cursor: &mut BitCursor<'_>, position: u64) -> Result<()> {
    let here = cursor.position();
    if position < here {
        return Err(OxiLhaError::invalid_header(format!(
            "header size ends at bit {position}, fields end at bit {here}"
        )));
    }
    cursor.skip_bits(position - here)
}

/// Decode a filename (Shift_JIS, falling back to lossy UTF-8) and normalise
/// separators to `/`.
pub fn decode_filename(bytes: &[u8]) -> String {
    let (decoded, _, had_errors) = SHIFT_JIS.decode(bytes);
    let name = if had_errors {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        decoded.into_owned()
    };
    name.replace('\\', "/")
}

/// Decode a directory extension: 0xFF separates components.
fn decode_directory(bytes: &[u8]) -> String {
    let bytes: Vec<u8> = bytes
        .iter()
        .map(|&b| if b == 0xFF { b'/' } else { b })
        .collect();
    let mut dir = decode_filename(&bytes);
    if !dir.is_empty() && !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}

/// Convert DOS date/time to SystemTime (interpreted as UTC).
fn dos_datetime_to_systime(date: u16, time: u16) -> Option<SystemTime> {
    // DOS date: bits 0-4 = day, 5-8 = month, 9-15 = year since 1980
    let day = u32::from(date & 0x1F);
    let month = u32::from((date >> 5) & 0x0F);
    let year = u32::from((date >> 9) & 0x7F) + 1980;

    // DOS time: bits 0-4 = seconds/2, 5-10 = minutes, 11-15 = hours
    let seconds = u64::from(time & 0x1F) * 2;
    let minutes = u64::from((time >> 5) & 0x3F);
    let hours = u64::from((time >> 11) & 0x1F);

    if day == 0 || month == 0 || month > 12 || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let mut days: u64 = (1970..year)
        .map(|y| if is_leap_year(y) { 366 } else { 365 })
        .sum();

    const MONTH_DAYS: [u64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    days += MONTH_DAYS[month as usize - 1];
    if month > 2 && is_leap_year(year) {
        days += 1;
    }
    days += u64::from(day - 1);

    let secs = days * 86400 + hours * 3600 + minutes * 60 + seconds;
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
