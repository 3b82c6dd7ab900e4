use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::debug;

use crate::error::{InstallError, Result};
use crate::key::ArtifactKey;
use crate::progress::ProgressRecord;

/// Characters left as-is in progress file names.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// One JSON file per [`ArtifactKey`]; the only record of job progress.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        let encoded = utf8_percent_encode(&key.to_string(), FILE_NAME).to_string();
        self.dir.join(format!("{encoded}.json"))
    }

    /// Atomically replaces the record for `key`.
    pub fn write(&self, key: &ArtifactKey, record: &ProgressRecord) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        quarry_fs::atomic_write(self.path_for(key), &json, Default::default())?;
        Ok(())
    }

    /// Missing and unreadable records both read as `None`.
    pub fn read(&self, key: &ArtifactKey) -> Option<ProgressRecord> {
        let path = self.path_for(key);
        let bytes = std::fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable progress record");
                None
            }
        }
    }

    pub fn delete(&self, key: &ArtifactKey) -> Result<bool> {
        Ok(quarry_fs::remove_file_if_exists(self.path_for(key))?)
    }

    /// Every readable record, ordered by key.
    pub fn list(&self) -> Result<Vec<(ArtifactKey, ProgressRecord)>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(InstallError::io(&self.dir, e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| InstallError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Ok(decoded) = percent_decode_str(stem).decode_utf8() else {
                continue;
            };
            let Some(key) = ArtifactKey::parse(&decoded) else {
                continue;
            };
            if let Some(record) = self.read(&key) {
                records.push((key, record));
            }
        }
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}
