use crate::{Error, Result};
use std::path::Path;

/// Removes a directory tree; returns whether anything was there.
pub fn remove_dir_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Removes a file; returns whether it existed.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_remove_dir_if_exists() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("clients/Release/1.20.1");
        std::fs::create_dir_all(tree.join("native/linux")).unwrap();
        std::fs::write(tree.join("client.jar"), "x").unwrap();

        assert!(remove_dir_if_exists(&tree).unwrap());
        assert!(!tree.exists());
        assert!(!remove_dir_if_exists(&tree).unwrap());
    }
}
