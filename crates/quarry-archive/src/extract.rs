use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::sanitize::sanitize_path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Clone, Debug, Default)]
pub struct ExtractReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries:     Vec<ExtractedEntry>,
}

/// Extracts the zip archive at `archive` into `destination`.
pub fn extract_zip_file(
    archive: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let archive = archive.as_ref();
    let file = File::open(archive).map_err(|e| Error::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    extract_zip(BufReader::new(file), destination.as_ref(), options)
}

/// Extracts a zip stream into `destination`, consulting
/// [`ExtractOptions::on_entry`] before every member.
pub fn extract_zip<R: Read + Seek>(
    reader: R,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut report = ExtractReport::default();

    std::fs::create_dir_all(destination).map_err(|e| Error::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_string();

        let raw_path = file
            .enclosed_name()
            .ok_or_else(|| Error::ZipSlip { entry: name.clone() })?;

        if !options.should_continue(&raw_path) {
            return Err(Error::Interrupted);
        }
        if options.is_excluded(&name) {
            continue;
        }

        let target = sanitize_path(&raw_path, destination)?;

        if file.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::DirectoryCreationFailed {
                path: target.clone(),
                source: e,
            })?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut out = File::create(&target).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: e,
        })?;
        let size = io::copy(&mut file, &mut out).map_err(|e| Error::ExtractionFailed {
            path: target.clone(),
            source: e,
        })?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // keep execute bits, never drop owner read/write
            let perms = std::fs::Permissions::from_mode((mode & 0o777) | 0o600);
            std::fs::set_permissions(&target, perms).map_err(|e| Error::ExtractionFailed {
                path: target.clone(),
                source: e,
            })?;
        }

        debug!(entry = %name, bytes = size, "extracted");
        report.entry_count += 1;
        report.total_bytes += size;
        report.entries.push(ExtractedEntry { path: target, size });
    }

    Ok(report)
}
