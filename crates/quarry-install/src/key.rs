use std::fmt;

use crate::error::{InstallError, Result};

/// Identifies one install job and its install directory: `Category/id`.
///
/// Both parts become directory names, so each must be a single plain path
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    category: String,
    id:       String,
}

impl ArtifactKey {
    /// The category is normalised, so `release` and `Release` name the same job.
    pub fn new(id: impl Into<String>, category: &str) -> Result<Self> {
        let id = id.into();
        let category = normalize_category(category);
        check_segment("id", &id)?;
        check_segment("category", &category)?;
        Ok(Self { category, id })
    }

    pub fn release(id: impl Into<String>) -> Result<Self> {
        Self::new(id, "")
    }

    /// Parses the `Category/id` display form.
    pub fn parse(value: &str) -> Option<Self> {
        let (category, id) = value.split_once('/')?;
        Self::new(id, category).ok()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.id)
    }
}

/// First character upper-cased, the rest lower-cased. Blank becomes `Release`.
pub fn normalize_category(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    match chars.next() {
        None => "Release".to_string(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

fn check_segment(field: &'static str, value: &str) -> Result<()> {
    let invalid = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control());
    if invalid {
        return Err(InstallError::InvalidKey {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_normalisation() {
        assert_eq!(normalize_category("release"), "Release");
        assert_eq!(normalize_category("SNAPSHOT"), "Snapshot");
        assert_eq!(normalize_category("  old_beta "), "Old_beta");
        assert_eq!(normalize_category(""), "Release");
        assert_eq!(normalize_category("   "), "Release");
    }

    #[test]
    fn keys_with_equivalent_categories_are_equal() {
        assert_eq!(
            ArtifactKey::new("1.20.1", "release").unwrap(),
            ArtifactKey::release("1.20.1").unwrap()
        );
    }

    #[test]
    fn display_and_parse() {
        let key = ArtifactKey::new("1.20.1", "Release").unwrap();
        assert_eq!(key.to_string(), "Release/1.20.1");
        assert_eq!(ArtifactKey::parse("Release/1.20.1"), Some(key));
        assert_eq!(ArtifactKey::parse("no-separator"), None);
        assert_eq!(ArtifactKey::parse("Release/"), None);
        assert_eq!(ArtifactKey::parse("Release/a/b"), None);
    }

    #[test]
    fn ids_that_are_not_single_segments_are_rejected() {
        for id in ["", " ", ".", "..", "a/b", "..\\x", "c:evil", "a\nb"] {
            assert!(
                matches!(ArtifactKey::release(id), Err(InstallError::InvalidKey { field: "id", .. })),
                "{id:?} accepted"
            );
        }
        assert!(ArtifactKey::release("1.20.1-pre1").is_ok());
        assert!(ArtifactKey::release("b1.7.3").is_ok());
        assert!(ArtifactKey::release("1.20.1 pre 1").is_ok());
    }

    #[test]
    fn categories_that_are_not_single_segments_are_rejected() {
        for category in ["..", ".", "x/y", "x\\y"] {
            assert!(
                matches!(ArtifactKey::new("1.0", category), Err(InstallError::InvalidKey { field: "category", .. })),
                "{category:?} accepted"
            );
        }
    }
}
