use std::path::{Component, Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::key::ArtifactKey;

/// Every on-disk location, derived from one base directory.
///
/// ```text
/// <base>/
///   settings.toml
///   clients/<Category>/<id>/      install tree
///   cache/progress/<key>.json     progress records
///   cache/libraries/<path>        shared library and native cache
///   assets/indexes/<id>.json      resource indexes
///   assets/objects/<h[0:2]>/<h>   content-addressed resources
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub const ENV_VAR: &str = "QUARRY_HOME";

    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// `$QUARRY_HOME`, falling back to `~/.quarry`.
    pub fn from_env() -> Result<Self> {
        if let Some(base) = std::env::var_os(Self::ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(Self::new(base));
        }
        let home = home::home_dir().ok_or(InstallError::NoHome)?;
        Ok(Self::new(home.join(".quarry")))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join("settings.toml")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.base.join("clients")
    }

    pub fn client_dir(&self, key: &ArtifactKey) -> PathBuf {
        self.clients_dir().join(key.category()).join(key.id())
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.base.join("cache").join("progress")
    }

    pub fn library_cache(&self) -> PathBuf {
        self.base.join("cache").join("libraries")
    }

    /// Cache location for a library declared at `relative`.
    pub fn library_path(&self, relative: &str) -> Result<PathBuf> {
        safe_join(&self.library_cache(), relative)
    }

    pub fn asset_indexes_dir(&self) -> PathBuf {
        self.base.join("assets").join("indexes")
    }

    /// Index file for `id`; ids that would leave the index directory are refused.
    pub fn asset_index(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() {
            return Err(InstallError::UnsafePath(id.to_string()));
        }
        safe_join(&self.asset_indexes_dir(), &format!("{id}.json"))
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.base.join("assets").join("objects")
    }

    pub fn asset_object(&self, hash: &str) -> PathBuf {
        let shard = hash.get(..2).unwrap_or(hash);
        self.asset_objects_dir().join(shard).join(hash)
    }
}

/// Joins a document-supplied relative path, refusing roots and `..`.
pub(crate) fn safe_join(base: &Path, relative: &str) -> Result<PathBuf> {
    let mut out = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(InstallError::UnsafePath(relative.to_string())),
        }
    }
    if out == base {
        return Err(InstallError::UnsafePath(relative.to_string()));
    }
    Ok(out)
}
