use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

/// Called with each entry's relative path before it is written.
/// Returning [`ControlFlow::Break`] stops extraction with [`crate::Error::Interrupted`].
pub type EntryCallback = Arc<dyn Fn(&Path) -> ControlFlow<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub exclude_prefixes: Vec<String>,
    pub on_entry: Option<EntryCallback>,
}

impl ExtractOptions {
    /// Skip entries whose archive name starts with `prefix`.
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    pub fn on_entry(mut self, callback: EntryCallback) -> Self {
        self.on_entry = Some(callback);
        self
    }

    pub(crate) fn is_excluded(&self, name: &str) -> bool {
        self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub(crate) fn should_continue(&self, entry: &Path) -> bool {
        match &self.on_entry {
            Some(callback) => callback(entry).is_continue(),
            None => true,
        }
    }
}

impl std::fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("exclude_prefixes", &self.exclude_prefixes)
            .field("on_entry", &self.on_entry.is_some())
            .finish()
    }
}
