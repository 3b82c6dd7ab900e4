use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves an archive entry path under `base`, refusing anything that
/// would land outside it.
pub fn sanitize_path(entry_path: &Path, base: &Path) -> Result<PathBuf> {
    let normalized = normalize_relative(entry_path).ok_or_else(|| Error::ZipSlip {
        entry: entry_path.display().to_string(),
    })?;
    Ok(base.join(normalized))
}

/// Lexically resolves `.` and `..` without touching the filesystem.
///
/// `None` for rooted paths and for any `..` that climbs above the start.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(result)
}
