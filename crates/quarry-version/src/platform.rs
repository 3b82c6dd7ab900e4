use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical native-binary bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Mac,
    Unknown,
}

impl Platform {
    /// Maps classifier keys such as `natives-windows-64` or `natives-osx`.
    ///
    /// Rules are checked in order: `win`, then `linux`, then `osx`/`mac`.
    pub fn from_classifier(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        if key.contains("win") {
            Self::Windows
        } else if key.contains("linux") {
            Self::Linux
        } else if key.contains("osx") || key.contains("mac") {
            Self::Mac
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
