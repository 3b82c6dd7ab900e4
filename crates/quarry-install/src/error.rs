use std::io;
use std::path::PathBuf;

use quarry_fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    /// The job was cancelled. Not a failure for reporting purposes.
    #[error("installation cancelled")]
    Cancelled,

    #[error(transparent)]
    Metadata(MetadataError),

    #[error("version document is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Fetch(FetchError),

    #[error("failed to extract natives from {path}: {source}")]
    Extract {
        path:   PathBuf,
        #[source]
        source: quarry_archive::Error,
    },

    #[error("failed to read resource index {path}: {source}")]
    ResourceIndex {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("refusing to place artifact at unsafe relative path '{0}'")]
    UnsafePath(String),

    #[error("resource '{key}' has invalid object hash '{hash}'")]
    InvalidResourceHash { key: String, hash: String },

    #[error("invalid artifact {field} '{value}': must be a single path segment")]
    InvalidKey { field: &'static str, value: String },

    #[error(transparent)]
    Fs(#[from] quarry_fs::Error),

    #[error("i/o error at {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("stage weights must sum to 100, got {0}")]
    InvalidWeights(u32),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to encode progress record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid settings file {path}: {source}")]
    Settings {
        path:   PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode settings: {0}")]
    SettingsEncode(#[from] toml::ser::Error),

    #[error("cannot determine the home directory; set QUARRY_HOME")]
    NoHome,

    #[error("failed to spawn install worker: {0}")]
    Spawn(#[source] io::Error),
}

impl InstallError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extract(path: impl Into<PathBuf>, source: quarry_archive::Error) -> Self {
        match source {
            quarry_archive::Error::Interrupted => Self::Cancelled,
            source => Self::Extract {
                path: path.into(),
                source,
            },
        }
    }
}

impl From<FetchError> for InstallError {
    fn from(e: FetchError) -> Self {
        if e.is_interrupted() { Self::Cancelled } else { Self::Fetch(e) }
    }
}

impl From<MetadataError> for InstallError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::Interrupted => Self::Cancelled,
            other => Self::Metadata(other),
        }
    }
}

impl From<quarry_fetch::Interrupted> for InstallError {
    fn from(_: quarry_fetch::Interrupted) -> Self {
        Self::Cancelled
    }
}

/// Failures of the metadata collaborator.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("version catalog unavailable ({tried} sources tried)")]
    CatalogUnavailable { tried: usize },

    #[error("version not found in catalog: {0}")]
    UnknownVersion(String),

    #[error("catalog entry for {0} has no document URL")]
    MissingUrl(String),

    #[error("failed to fetch version document from {url}: {source}")]
    Document {
        url:    String,
        #[source]
        source: FetchError,
    },

    #[error("metadata request interrupted")]
    Interrupted,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read install manifest {path}: {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by an [`InstallNotifier`](crate::InstallNotifier); always swallowed.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

pub type Result<T> = std::result::Result<T, InstallError>;
