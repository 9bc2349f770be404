//! Extract command implementation.

use crate::utils::{create_progress_bar, filter_entries, is_requested, open_archive};
use filetime::FileTime;
use oxilha_archive::LzhEntry;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub output: &'a Path,
    pub files: &'a [String],
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub verbose: bool,
    pub progress: bool,
}

pub fn cmd_extract(
    archive: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let lzh = open_archive(archive)?;

    println!(
        "Extracting {} to {}",
        archive.display(),
        options.output.display()
    );

    let to_extract: Vec<_> = filter_entries(lzh.entries(), options.include, options.exclude)
        .into_iter()
        .filter(|(_, e)| is_requested(&e.name, options.files))
        .collect();

    let pb = create_progress_bar(to_extract.len() as u64, options.progress);
    pb.set_message("files");

    let mut failures: Vec<(String, String)> = Vec::new();

    for (index, entry) in &to_extract {
        let Some(relative) = entry.safe_path() else {
            warn!(name = %entry.name, "refusing to extract outside the output directory");
            failures.push((entry.name.clone(), "unsafe path".to_string()));
            pb.inc(1);
            continue;
        };
        let path = options.output.join(relative);

        if entry.is_dir {
            fs::create_dir_all(&path)?;
            if options.verbose {
                pb.println(format!("  Created: {}", entry.name));
            }
        } else {
            match lzh.extract(*index) {
                Ok(data) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, &data)?;
                    restore_mtime(&path, entry);
                    if options.verbose {
                        pb.println(format!(
                            "  Extracted: {} ({} bytes)",
                            entry.name,
                            data.len()
                        ));
                    }
                }
                Err(e) => {
                    pb.println(format!("  FAILED: {} - {}", entry.name, e));
                    failures.push((entry.name.clone(), e.to_string()));
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    if !failures.is_empty() {
        return Err(format!(
            "{} of {} entries could not be extracted",
            failures.len(),
            to_extract.len()
        )
        .into());
    }

    println!("Extracted {} entries", to_extract.len());
    Ok(())
}

/// Apply the entry's timestamp to an extracted file; failures are logged only.
fn restore_mtime(path: &Path, entry: &LzhEntry) {
    let Some(modified) = entry.modified else {
        return;
    };
    if let Err(e) = filetime::set_file_mtime(path, FileTime::from_system_time(modified)) {
        debug!(path = %path.display(), "could not set modification time: {e}");
    }
}
