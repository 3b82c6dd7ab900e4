//! Detection of native binding libraries shadowed by a newer copy.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Dotted numeric version taken from the last `-` segment of a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddedVersion(Vec<u32>);

impl EmbeddedVersion {
    /// `lwjgl-glfw-3.2.2.jar` yields `3.2.2`; names without a numeric tail yield `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, tail) = name.rsplit_once('-')?;
        let tail = tail.strip_suffix(".jar").unwrap_or(tail);
        if tail.is_empty() {
            return None;
        }
        tail.split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }
}

impl PartialOrd for EmbeddedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EmbeddedVersion {
    /// Missing trailing components compare as zero, so `3.2` equals `3.2.0`.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| {
                let a = self.0.get(i).copied().unwrap_or(0);
                let b = other.0.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for EmbeddedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Marks older copies of a library family as skippable.
///
/// Files are grouped by module, the text before the first `-`. Only modules
/// whose name starts with one of `families` take part.
#[derive(Debug, Clone)]
pub struct SupersededRule {
    families: Vec<String>,
    highest:  HashMap<String, EmbeddedVersion>,
}

impl Default for SupersededRule {
    fn default() -> Self {
        Self::new(["lwjgl"])
    }
}

impl SupersededRule {
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            families: families.into_iter().map(|f| f.into().to_ascii_lowercase()).collect(),
            highest:  HashMap::new(),
        }
    }

    /// Builds the rule and records every name in one pass.
    pub fn with_names<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.observe(name);
        }
        self
    }

    /// Records `name` as part of the install set.
    pub fn observe(&mut self, name: &str) {
        let Some((module, version)) = self.classify(name) else {
            return;
        };
        match self.highest.get(&module) {
            Some(current) if *current >= version => {}
            _ => {
                self.highest.insert(module, version);
            }
        }
    }

    /// True when a newer file of the same module has been observed.
    pub fn is_superseded(&self, name: &str) -> bool {
        let Some((module, version)) = self.classify(name) else {
            return false;
        };
        self.highest.get(&module).is_some_and(|highest| version < *highest)
    }

    pub fn highest(&self, module: &str) -> Option<&EmbeddedVersion> {
        self.highest.get(&module.to_ascii_lowercase())
    }

    fn classify(&self, name: &str) -> Option<(String, EmbeddedVersion)> {
        let lowered = name.to_ascii_lowercase();
        if !self.families.iter().any(|f| lowered.starts_with(f.as_str())) {
            return None;
        }
        let module = lowered.split('-').next()?.to_string();
        let version = EmbeddedVersion::from_file_name(&lowered)?;
        Some((module, version))
    }
}
