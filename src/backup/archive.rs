use std::fs::{self, File};
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use flate2::read::GzDecoder;

use crate::error::{Error, Result};
use crate::types::{ArchiveEntry, ArchiveFile};

pub const ARCHIVE_EXTENSION: &str = "tgz";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `<name>-YYYY-MM-DD_HH-MM-SS.tgz`. Zero-padded fields keep names in
/// chronological order when sorted as strings.
#[must_use]
pub fn archive_file_name(name: &str, at: &DateTime<Local>) -> String {
    format!("{name}-{}.{ARCHIVE_EXTENSION}", at.format(TIMESTAMP_FORMAT))
}

/// Archives in `dir`, sorted by name. A missing directory has none.
pub fn list_archives(dir: &Path) -> Result<Vec<ArchiveFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut archives = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if !metadata.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(ARCHIVE_EXTENSION)
        {
            continue;
        }
        archives.push(ArchiveFile {
            name: entry.file_name().to_string_lossy().to_string(),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        });
    }

    archives.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(archives)
}

/// Decodes the whole archive, returning its entries. Truncated or corrupt
/// archives are rejected.
pub fn verify_archive(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let invalid = |reason: String| Error::Archive {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| invalid(e.to_string()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut entries = Vec::new();
    for entry in archive.entries().map_err(|e| invalid(e.to_string()))? {
        let mut entry = entry.map_err(|e| invalid(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| invalid(e.to_string()))?
            .into_owned();
        let is_dir = entry.header().entry_type().is_dir();
        let size_bytes = io::copy(&mut entry, &mut io::sink())
            .map_err(|e| invalid(format!("{}: {e}", entry_path.display())))?;
        entries.push(ArchiveEntry {
            path: entry_path,
            size_bytes,
            is_dir,
        });
    }

    if entries.is_empty() {
        return Err(invalid("archive has no entries".to_string()));
    }
    Ok(entries)
}

/// Human-readable size in the style of `ls -lh`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    if value < 10.0 {
        format!("{value:.1}{unit}")
    } else {
        format!("{value:.0}{unit}")
    }
}
