use std::path::Path;

use quarry_fs::AtomicWriteOptions;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{InstallError, Result};

/// User settings read from `settings.toml`.
///
/// ```toml
/// url_proxy = "https://mirror.example/?u="
/// low_data_mode = false
/// verify_cached_resources = false
/// asset_threads = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Prefix prepended to every remote URL. Empty disables rewriting.
    pub url_proxy:               String,
    /// Halves the resolution of the cosmetic display image.
    pub low_data_mode:           bool,
    /// Re-hash resources already in the object store instead of trusting presence.
    pub verify_cached_resources: bool,
    /// Overrides the CPU-based worker count for resource downloads.
    pub asset_threads:           Option<usize>,
}

impl Settings {
    /// Missing or unreadable settings yield the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "ignoring settings file");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(InstallError::io(path, e)),
        };
        toml::from_str(&text).map_err(|source| InstallError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        quarry_fs::atomic_write(path, text.as_bytes(), AtomicWriteOptions::new().sync(true))?;
        Ok(())
    }

    pub fn url_prefix(&self) -> Option<&str> {
        let prefix = self.url_proxy.trim();
        (!prefix.is_empty()).then_some(prefix)
    }
}
