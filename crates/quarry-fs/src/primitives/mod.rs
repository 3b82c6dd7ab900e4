pub mod atomic_write;
pub mod copy_file;
pub mod remove;
pub mod replace_file;

pub use atomic_write::{AtomicWriteOptions, atomic_write};
pub use copy_file::copy_file;
pub use remove::{remove_dir_if_exists, remove_file_if_exists};
pub use replace_file::{PART_SUFFIX, part_path, replace_file};
