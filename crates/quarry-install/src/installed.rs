use std::path::PathBuf;

use tracing::warn;

use crate::error::{InstallError, Result};
use crate::key::ArtifactKey;
use crate::layout::Layout;
use crate::manifest::InstallManifest;

/// A client directory found under `clients/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledClient {
    pub key:      ArtifactKey,
    pub path:     PathBuf,
    pub manifest: InstallManifest,
}

impl InstalledClient {
    pub fn display_name(&self) -> &str {
        self.manifest.display_name.as_deref().unwrap_or(self.key.id())
    }
}

/// Lists every installed client, sorted by category then id.
///
/// Directories without a readable manifest are still listed with defaults.
pub fn scan_installed(layout: &Layout) -> Result<Vec<InstalledClient>> {
    let clients_dir = layout.clients_dir();
    let mut clients = Vec::new();

    for category in subdirectories(&clients_dir)? {
        let Some(category_name) = category.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        for version in subdirectories(&category)? {
            let Some(key) = version
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|id| ArtifactKey::new(id, &category_name).ok())
            else {
                continue;
            };
            let manifest = InstallManifest::read_from(&version).unwrap_or_else(|e| {
                warn!(path = %version.display(), error = %e, "unreadable install manifest");
                InstallManifest::default()
            });
            clients.push(InstalledClient {
                key,
                path: version.clone(),
                manifest,
            });
        }
    }

    clients.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(clients)
}

fn subdirectories(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(InstallError::io(dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(dir, e))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_categories_and_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let release = layout.client_dir(&ArtifactKey::release("1.20.1").unwrap());
        std::fs::create_dir_all(&release).unwrap();
        InstallManifest {
            version_type: "release".into(),
            ..InstallManifest::default()
        }
        .write_to(&release)
        .unwrap();

        let beta = layout.clients_dir().join("old_beta").join("b1.7.3");
        std::fs::create_dir_all(&beta).unwrap();
        std::fs::write(beta.join("data.ini"), "display_name=Beta\ntotal_size_bytes=oops\n").unwrap();
        std::fs::write(layout.clients_dir().join("stray.txt"), b"x").unwrap();

        let clients = scan_installed(&layout).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].key, ArtifactKey::new("b1.7.3", "Old_beta").unwrap());
        assert_eq!(clients[0].display_name(), "b1.7.3");
        assert_eq!(clients[1].manifest.version_type, "release");
        assert_eq!(clients[1].display_name(), "1.20.1");
    }

    #[test]
    fn empty_layout_has_no_clients() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_installed(&Layout::new(dir.path())).unwrap().is_empty());
    }
}
