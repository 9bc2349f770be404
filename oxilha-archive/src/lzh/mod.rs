//! LZH/LHA archive reading.
//!
//! Archives are parsed from memory: headers are walked once up front, and
//! each entry keeps the byte range of its payload so entries can be decoded
//! independently, in any order, from any number of threads.

mod header;

pub use header::{DIRECTORY_METHOD, LzhHeader, decode_filename};

use oxilha_core::bitcursor::BitCursor;
use oxilha_core::crc::Crc16;
use oxilha_core::error::{OxiLhaError, Result};
use oxilha_lzh::{DecodeOptions, Decoder, LzhMethod};
use std::fs;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One entry of an LZH archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzhEntry {
    /// Path inside the archive, `/`-separated.
    pub name: String,
    /// Raw 5-byte method id.
    pub method_id: [u8; 5],
    /// Known method, if any.
    pub method: Option<LzhMethod>,
    /// Payload size in the archive.
    pub compressed_size: u64,
    /// Declared uncompressed size.
    pub original_size: u64,
    /// Raw MS-DOS timestamp.
    pub timestamp: u32,
    /// Modification time decoded from `timestamp`.
    pub modified: Option<SystemTime>,
    /// File attribute byte.
    pub attribute: u8,
    /// Header level.
    pub level: u8,
    /// CRC-16 of the original data.
    pub crc16: u16,
    /// OS identifier (level 1 only).
    pub os_id: Option<u8>,
    /// Directory entry.
    pub is_dir: bool,
    /// Byte range of the payload within the archive.
    pub data_range: Range<usize>,
}

impl LzhEntry {
    fn from_header(header: LzhHeader, data_range: Range<usize>) -> Self {
        Self {
            method: LzhMethod::from_id(&header.method_id),
            compressed_size: header.payload_size(),
            original_size: u64::from(header.original_size),
            modified: header.modified(),
            is_dir: header.is_dir(),
            name: header.filename,
            method_id: header.method_id,
            timestamp: header.timestamp,
            attribute: header.attribute,
            level: header.level,
            crc16: header.crc16,
            os_id: header.os_id,
            data_range,
        }
    }

    /// Method id as text, e.g. `-lh5-`.
    pub fn method_name(&self) -> String {
        String::from_utf8_lossy(&self.method_id).into_owned()
    }

    /// Compressed / original size (1.0 for empty entries).
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }

    /// Relative path for extraction, or `None` if the name is absolute or
    /// climbs out of the destination with `..`.
    pub fn safe_path(&self) -> Option<PathBuf> {
        let mut path = PathBuf::new();
        for component in Path::new(&self.name).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}

/// An LZH archive held in memory.
#[derive(Debug, Clone)]
pub struct LzhArchive {
    data: Vec<u8>,
    entries: Vec<LzhEntry>,
}

impl LzhArchive {
    /// Parse an archive from its bytes.
    pub fn parse(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let entries = Self::read_entries(&data)?;
        debug!(entries = entries.len(), bytes = data.len(), "parsed archive");
        Ok(Self { data, entries })
    }

    /// Read and parse an archive file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(fs::read(path)?)
    }

    /// Whether `data` starts with something shaped like an LZH header.
    pub fn looks_like_lzh(data: &[u8]) -> bool {
        data.len() >= 22
            && data[0] != 0
            && data[2] == b'-'
            && data[3] == b'l'
            && data[6] == b'-'
    }

    fn read_entries(data: &[u8]) -> Result<Vec<LzhEntry>> {
        let mut cursor = BitCursor::new(data);
        let mut entries = Vec::new();

        while let Some(header) = LzhHeader::parse(&mut cursor)? {
            let start = cursor.byte_position();
            let len = header.payload_size();
            if cursor.skip_bits(len * 8).is_err() {
                return Err(OxiLhaError::invalid_header(format!(
                    "payload of '{}' runs past the end of the archive",
                    header.filename
                )));
            }
            debug!(
                name = %header.filename,
                method = %header.method_name(),
                level = header.level,
                packed = len,
                original = header.original_size,
                "entry"
            );
            let range = start as usize..(start + len) as usize;
            entries.push(LzhEntry::from_header(header, range));
        }

        Ok(entries)
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[LzhEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Raw payload bytes of an entry.
    pub fn payload(&self, index: usize) -> Result<&[u8]> {
        let entry = self.entry(index)?;
        Ok(&self.data[entry.data_range.clone()])
    }

    fn entry(&self, index: usize) -> Result<&LzhEntry> {
        self.entries
            .get(index)
            .ok_or_else(|| OxiLhaError::entry_not_found(format!("#{index}")))
    }

    /// Decode an entry and verify its CRC-16.
    pub fn extract(&self, index: usize) -> Result<Vec<u8>> {
        self.extract_with(index, &DecodeOptions::default())
    }

    /// Decode an entry with cancellation and an output cap.
    pub fn extract_with(&self, index: usize, options: &DecodeOptions) -> Result<Vec<u8>> {
        let entry = self.entry(index)?;
        if entry.is_dir {
            return Ok(Vec::new());
        }

        let decoder = Decoder::for_method(&entry.method_id)
            .ok_or_else(|| OxiLhaError::unsupported_method(entry.method_name()))?;
        debug!(name = %entry.name, strategy = ?decoder, "extracting");

        let output = decoder.decode_with(self.payload(index)?, entry.original_size, options)?;
        if let Err(err) = Crc16::verify(&output, entry.crc16) {
            warn!(name = %entry.name, "{err}");
            return Err(err);
        }
        Ok(output)
    }

    /// Decode the first entry named `name`.
    pub fn extract_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .position(name)
            .ok_or_else(|| OxiLhaError::entry_not_found(name))?;
        self.extract(index)
    }

    /// Decode every entry in order; one entry failing does not stop the rest.
    pub fn extract_all(&self) -> Vec<Result<Vec<u8>>> {
        (0..self.entries.len()).map(|i| self.extract(i)).collect()
    }

    /// Decode every entry on the rayon thread pool, results in archive order.
    #[cfg(feature = "parallel")]
    pub fn extract_all_parallel(&self) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        (0..self.entries.len())
            .into_par_iter()
            .map(|i| self.extract(i))
            .collect()
    }
}
