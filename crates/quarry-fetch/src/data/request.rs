use std::path::{Path, PathBuf};

use quarry_verify::Checksum;

/// One remote file and where it should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url:         String,
    pub destination: PathBuf,
    pub checksum:    Option<Checksum>,
    /// Declared size, used as the progress total when the server sends none.
    pub size:        Option<u64>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, destination: impl AsRef<Path>) -> Self {
        Self {
            url:         url.into(),
            destination: destination.as_ref().to_path_buf(),
            checksum:    None,
            size:        None,
        }
    }

    pub fn checksum(mut self, checksum: Option<Checksum>) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }
}
