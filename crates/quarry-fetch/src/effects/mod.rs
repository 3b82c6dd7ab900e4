mod fetcher;
mod http;

pub use fetcher::Fetcher;
pub use http::{HttpClient, Response};

#[cfg(feature = "reqwest")]
pub use http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};
