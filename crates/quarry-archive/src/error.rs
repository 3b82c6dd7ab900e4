use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("zip-slip attack detected: entry '{entry}' resolves outside the destination")]
    ZipSlip { entry: String },

    #[error("failed to open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("archive is corrupted: {0}")]
    Corrupted(String),

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("extraction interrupted")]
    Interrupted,
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Corrupted(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
