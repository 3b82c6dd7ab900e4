pub mod table;
pub mod tracker;

pub use indicatif::HumanBytes;
