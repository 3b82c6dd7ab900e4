use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Copies `src` to `dest` through a `.part` sibling, creating parents.
///
/// Copying a path onto itself is a no-op.
pub fn copy_file(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if same_file(src, dest) {
        return fs::metadata(src).map(|m| m.len()).map_err(|e| Error::Read {
            path: src.to_path_buf(),
            source: e,
        });
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let staged = crate::primitives::part_path(dest);
    let copied = fs::copy(src, &staged).map_err(|e| Error::Copy {
        from: src.to_path_buf(),
        to: staged.clone(),
        source: e,
    })?;

    crate::primitives::replace_file(&staged, dest).inspect_err(|_| {
        let _ = fs::remove_file(&staged);
    })?;
    Ok(copied)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
