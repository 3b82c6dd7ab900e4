use std::time::Duration;

/// Configuration shared by every transfer a [`Fetcher`](crate::Fetcher) makes.
///
/// # Examples
///
/// ```
/// use quarry_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .retries(5)
///     .retry_backoff(Duration::from_millis(100))
///     .url_prefix("https://mirror.example/");
/// ```
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total attempts per transfer, including the first. Zero is treated as one.
    ///
    /// Default: 3
    pub retries: u32,

    /// Bytes requested per body read; cancellation is checked between reads.
    ///
    /// Default: 64 KiB
    pub chunk_size: usize,

    /// Base delay before attempt `n + 1`, doubled per failure.
    ///
    /// Default: 250ms
    pub retry_backoff: Duration,

    /// Prepended verbatim to every remote URL. Empty or `None` disables rewriting.
    pub url_prefix: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retries:       3,
            chunk_size:    64 * 1024,
            retry_backoff: Duration::from_millis(250),
            url_prefix:    None,
        }
    }
}

impl FetchOptions {
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.url_prefix = (!prefix.trim().is_empty()).then(|| prefix.trim().to_string());
        self
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.retries, 3);
        assert_eq!(options.chunk_size, 65536);
        assert!(options.url_prefix.is_none());
    }

    #[test]
    fn blank_prefix_disables_rewriting() {
        assert!(FetchOptions::default().url_prefix("   ").url_prefix.is_none());
        assert_eq!(
            FetchOptions::default().url_prefix(" https://p/ ").url_prefix.as_deref(),
            Some("https://p/")
        );
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        assert_eq!(FetchOptions::default().retries(0).attempts(), 1);
    }
}
