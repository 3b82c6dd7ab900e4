//! Atomic filesystem primitives.
//!
//! Everything that lands at a final path goes through a sibling staging
//! file first and is renamed into place, so observers either see the old
//! content or the complete new content.

mod error;
pub mod primitives;

pub use error::{Error, Result};
pub use primitives::{
    AtomicWriteOptions, PART_SUFFIX, atomic_write, copy_file, part_path,
    remove_dir_if_exists, remove_file_if_exists, replace_file,
};
