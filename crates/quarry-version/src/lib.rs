//! Pure classification rules for artifact versions.
//!
//! - [`ResourceEra`] decides which resource workflow an artifact uses.
//! - [`SupersededRule`] finds native binding libraries shadowed by a newer copy.
//! - [`Platform`] buckets free-text native classifier keys.

pub use self::era::{MODERN_THRESHOLD, ReleaseVersion, ResourceEra};
pub use self::platform::Platform;
pub use self::superseded::{EmbeddedVersion, SupersededRule};

mod era;
mod platform;
mod superseded;
