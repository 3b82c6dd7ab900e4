use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of the in-flight sibling a download is streamed into.
pub const PART_SUFFIX: &str = ".part";

/// `dest` with [`PART_SUFFIX`] appended to its file name.
pub fn part_path(dest: impl AsRef<Path>) -> PathBuf {
    let dest = dest.as_ref();
    let mut name: OsString = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}

/// Moves `staged` over `dest`, replacing whatever was there.
pub fn replace_file(staged: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let staged = staged.as_ref();
    let dest = dest.as_ref();

    // rename() does not overwrite on Windows.
    #[cfg(windows)]
    if dest.exists() {
        std::fs::remove_file(dest).map_err(|e| Error::Replace {
            path: dest.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::rename(staged, dest).map_err(|e| Error::Replace {
        path: dest.to_path_buf(),
        source: e,
    })
}
