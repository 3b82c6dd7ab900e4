//! Resource-layout era.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RELEASE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<major>[0-9]+)(?:\.(?<minor>[0-9]+))?(?:\.[0-9]+)*$").unwrap());

/// Releases at or above this `(major, minor)` use the content-addressed layout.
pub const MODERN_THRESHOLD: (u32, u32) = (1, 6);

/// The `(major, minor)` prefix of a dotted release id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
}

impl ReleaseVersion {
    /// Parses `1.20.1`, `1.7.10-pre4` or `1` (minor defaults to 0).
    /// Anything after the first `-` is ignored.
    pub fn parse(id: &str) -> Option<Self> {
        let base = id.split('-').next().unwrap_or_default();
        let caps = RELEASE_REGEX.captures(base)?;
        let major = caps.name("major")?.as_str().parse().ok()?;
        let minor = match caps.name("minor") {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceEra {
    /// Resources ship with the client and library downloads.
    Legacy,
    /// Resources come from a fetched index and a shared object store.
    Modern,
}

impl ResourceEra {
    /// Snapshot and other non-dotted ids are treated as modern.
    pub fn of(id: &str) -> Self {
        match ReleaseVersion::parse(id) {
            Some(v) if v < threshold() => Self::Legacy,
            _ => Self::Modern,
        }
    }

    pub fn is_modern(self) -> bool {
        matches!(self, Self::Modern)
    }
}

fn threshold() -> ReleaseVersion {
    ReleaseVersion {
        major: MODERN_THRESHOLD.0,
        minor: MODERN_THRESHOLD.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_release_ids() {
        assert_eq!(ReleaseVersion::parse("1.20.1"), Some(ReleaseVersion { major: 1, minor: 20 }));
        assert_eq!(ReleaseVersion::parse("1.7.10-pre4"), Some(ReleaseVersion { major: 1, minor: 7 }));
        assert_eq!(ReleaseVersion::parse("2"), Some(ReleaseVersion { major: 2, minor: 0 }));
        assert_eq!(ReleaseVersion::parse("23w31a"), None);
        assert_eq!(ReleaseVersion::parse("b1.7.3"), None);
        assert_eq!(ReleaseVersion::parse(""), None);
    }

    #[test]
    fn era_boundaries() {
        assert_eq!(ResourceEra::of("1.5.2"), ResourceEra::Legacy);
        assert_eq!(ResourceEra::of("1.6"), ResourceEra::Modern);
        assert_eq!(ResourceEra::of("1.6.4"), ResourceEra::Modern);
        assert_eq!(ResourceEra::of("1.20.1"), ResourceEra::Modern);
        assert_eq!(ResourceEra::of("0.30"), ResourceEra::Legacy);
    }

    #[test]
    fn unparsable_ids_are_modern() {
        assert!(ResourceEra::of("23w31a").is_modern());
        assert!(ResourceEra::of("rd-132211").is_modern());
    }
}
