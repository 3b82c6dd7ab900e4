use std::fmt;
use std::io::Read;

use crate::error::TransportError;

/// An open response: its length hint and a blocking body reader.
pub struct Response {
    pub content_length: Option<u64>,
    pub body:           Box<dyn Read + Send>,
}

impl Response {
    pub fn new(content_length: Option<u64>, body: impl Read + Send + 'static) -> Self {
        Self {
            content_length,
            body: Box::new(body),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP client abstraction.
///
/// Implementations follow redirects and turn non-success statuses into a
/// [`TransportError`]. Tests substitute an in-memory implementation.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<Response, TransportError>;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use super::*;

    pub const DEFAULT_USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

    /// Upper bound for one request, body included.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Production client backed by `reqwest::blocking`.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::blocking::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self, TransportError> {
            Self::with_user_agent(DEFAULT_USER_AGENT)
        }

        pub fn with_user_agent(user_agent: &str) -> Result<Self, TransportError> {
            Self::with_timeout(user_agent, DEFAULT_TIMEOUT)
        }

        /// A stalled body read fails once `timeout` elapses, which the
        /// fetcher treats as a retryable transport error.
        pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(user_agent)
                .connect_timeout(Duration::from_secs(30).min(timeout))
                .timeout(timeout)
                .build()
                .map_err(|e| TransportError::new("<client>", e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        fn get(&self, url: &str) -> Result<Response, TransportError> {
            let map = |e: reqwest::Error| {
                let error = TransportError::new(url, e.to_string());
                match e.status() {
                    Some(status) => error.with_status(status.as_u16()),
                    None => error,
                }
            };

            let response = self.client.get(url).send().map_err(map)?;
            let response = response.error_for_status().map_err(map)?;
            Ok(Response::new(response.content_length(), response))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};
