use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::control::Interrupted;

/// Failure reported by an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone, Error)]
#[error("{url}: {message}")]
pub struct TransportError {
    pub url:     String,
    pub status:  Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url:     url.into(),
            status:  None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url:      String,
        expected: String,
        actual:   String,
    },

    #[error("i/o error at {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] quarry_fs::Error),

    #[error("download interrupted")]
    Interrupted,

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last:     Box<FetchError>,
    },

    #[error("failed to decode {url}: {source}")]
    Decode {
        url:    String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// The error that ended the final attempt.
    pub fn root(&self) -> &FetchError {
        match self {
            Self::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<Interrupted> for FetchError {
    fn from(_: Interrupted) -> Self {
        Self::Interrupted
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
