//! Zip extraction with path sanitization.
//!
//! - `sanitize.rs` - zip-slip prevention
//! - `extract.rs` - member-by-member extraction with an interruption hook
//! - `options.rs` - extraction knobs

pub use error::{Error, Result};
pub use extract::{ExtractReport, ExtractedEntry, extract_zip, extract_zip_file};
pub use options::{EntryCallback, ExtractOptions};
pub use sanitize::sanitize_path;

mod error;
mod extract;
mod options;
mod sanitize;
