use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Downloading,
    Paused,
    Cancelled,
    Error,
    Installed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Error | Self::Installed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
            Self::Installed => "installed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VersionMetadata,
    Client,
    Libraries,
    Natives,
    Resources,
    Finalize,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::VersionMetadata,
        Stage::Client,
        Stage::Libraries,
        Stage::Natives,
        Stage::Resources,
        Stage::Finalize,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VersionMetadata => "version_metadata",
            Self::Client => "client",
            Self::Libraries => "libraries",
            Self::Natives => "natives",
            Self::Resources => "resources",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted snapshot of what a job is doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub status:          Status,
    pub stage:           Stage,
    pub stage_percent:   u8,
    pub overall_percent: u8,
    pub message:         String,
    #[serde(default)]
    pub bytes_done:      u64,
    #[serde(default)]
    pub bytes_total:     u64,
}

impl ProgressRecord {
    /// Same snapshot, reported as paused.
    pub fn paused(&self) -> Self {
        Self {
            status: Status::Paused,
            message: "Paused".to_string(),
            ..self.clone()
        }
    }

    /// Same position, reported as failed with `message`.
    pub fn failed_here(&self, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            ..self.clone()
        }
    }

    pub fn cancelled() -> Self {
        Self::terminal(Status::Cancelled, "Installation cancelled")
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::terminal(Status::Error, message)
    }

    pub fn installed(bytes_done: u64, bytes_total: u64) -> Self {
        Self {
            status: Status::Installed,
            stage: Stage::Finalize,
            stage_percent: 100,
            overall_percent: 100,
            message: "Installation complete".to_string(),
            bytes_done,
            bytes_total,
        }
    }

    fn terminal(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            stage: Stage::Finalize,
            stage_percent: 0,
            overall_percent: 0,
            message: message.into(),
            bytes_done: 0,
            bytes_total: 0,
        }
    }
}
