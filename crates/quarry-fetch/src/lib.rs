//! HTTP downloading with streaming verification and atomic placement.
//!
//! # Architecture
//!
//! - `data` - request and option types
//! - `core` - pure helpers (backoff, URL rewriting)
//! - `effects` - the [`HttpClient`] seam and the [`Fetcher`]
//! - [`Control`] - cancellation and pause token threaded through every call
//!
//! The body is hashed while it streams into `<dest>.part`; the part file is
//! only renamed over `dest` once the digest matches.

mod control;
mod core;
mod data;
mod effects;
mod error;

pub use control::{Control, Interrupted, PauseHook};
pub use self::core::{apply_prefix, retry_delay};
pub use data::{FetchOptions, FetchRequest};
pub use effects::{Fetcher, HttpClient, Response};
pub use error::{FetchError, Result, TransportError};

#[cfg(feature = "reqwest")]
pub use effects::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestClient};
