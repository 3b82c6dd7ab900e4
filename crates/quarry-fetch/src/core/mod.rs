mod retry;
mod url;

pub use retry::retry_delay;
pub use url::apply_prefix;
