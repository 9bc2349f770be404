//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxilha_archive::{LzhArchive, LzhEntry};
use std::path::Path;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Read and parse an archive, warning when it does not look like LZH.
pub fn open_archive(path: &Path) -> Result<LzhArchive, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    if !data.is_empty() && !LzhArchive::looks_like_lzh(&data) {
        tracing::warn!(path = %path.display(), "file does not start with an LZH header");
    }
    Ok(LzhArchive::parse(data)?)
}

/// Check if a filename matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Whether `name` was requested explicitly, or lies under a requested directory.
pub fn is_requested(name: &str, files: &[String]) -> bool {
    files.is_empty()
        || files.iter().any(|f| {
            let f = f.trim_end_matches('/');
            name == f || name.strip_prefix(f).is_some_and(|rest| rest.starts_with('/'))
        })
}

/// Entries passing the include/exclude filters, with their archive index.
pub fn filter_entries<'a>(
    entries: &'a [LzhEntry],
    include: &[String],
    exclude: &[String],
) -> Vec<(usize, &'a LzhEntry)> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matches_filters(&e.name, include, exclude))
        .collect()
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[(usize, &LzhEntry)], verbose: bool) {
    if verbose {
        println!(
            "{:>10} {:>10} {:>6} {:>7} {:>6}  Name",
            "Size", "Compressed", "Ratio", "Method", "CRC",
        );
        println!("{}", "-".repeat(60));

        let mut total_size = 0u64;
        let mut total_compressed = 0u64;

        for (_, entry) in entries {
            let ratio = if entry.original_size > 0 {
                format!("{:.1}%", entry.compression_ratio() * 100.0)
            } else {
                "-".to_string()
            };
            let type_prefix = if entry.is_dir { "d " } else { "  " };

            println!(
                "{:>10} {:>10} {:>6} {:>7}   {:04X}  {}{}",
                entry.original_size,
                entry.compressed_size,
                ratio,
                entry.method_name(),
                entry.crc16,
                type_prefix,
                entry.name
            );

            total_size += entry.original_size;
            total_compressed += entry.compressed_size;
        }

        println!("{}", "-".repeat(60));
        let total_ratio = if total_size > 0 {
            total_compressed as f64 / total_size as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "{:>10} {:>10} {:>5.1}%                 {} files",
            total_size,
            total_compressed,
            total_ratio,
            entries.len()
        );
    } else {
        for (_, entry) in entries {
            println!("{}", entry.name);
        }
    }
}
