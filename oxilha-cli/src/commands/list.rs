//! List command implementation.

use crate::utils::{filter_entries, open_archive, print_entries};
use oxilha_archive::LzhEntry;
use serde::Serialize;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson {
    name: String,
    size: u64,
    compressed_size: u64,
    ratio: f64,
    method: String,
    crc: u16,
    level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    os_id: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtime: Option<u64>,
    is_dir: bool,
}

impl EntryJson {
    fn from_entry(entry: &LzhEntry) -> Self {
        let mtime = entry
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        Self {
            name: entry.name.clone(),
            size: entry.original_size,
            compressed_size: entry.compressed_size,
            ratio: entry.compression_ratio(),
            method: entry.method_name(),
            crc: entry.crc16,
            level: entry.level,
            os_id: entry.os_id.map(char::from),
            mtime,
            is_dir: entry.is_dir,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson {
    archive: String,
    format: &'static str,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let lzh = open_archive(archive)?;
    let filtered = filter_entries(lzh.entries(), options.include, options.exclude);

    if options.json {
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            format: "LZH",
            entries: filtered
                .iter()
                .map(|(_, e)| EntryJson::from_entry(e))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} (LZH)", archive.display());
    println!();
    print_entries(&filtered, options.verbose);
    Ok(())
}
