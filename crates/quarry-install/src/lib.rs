//! Staged installation of game clients.
//!
//! # Architecture
//!
//! - [`Installer`] - the six-stage pipeline, run on one thread per job
//! - [`JobRegistry`] - one job per [`ArtifactKey`], with pause, resume and cancel
//! - [`ProgressStore`] - one JSON status record per key, readable from other processes
//! - [`AssetPool`] - bounded worker pool for resource bodies
//! - [`InstallManifest`] - the `data.ini` written into every finished install
//!
//! ```text
//! version_metadata → client → libraries → natives → resources → finalize
//! ```
//!
//! Every stage polls the job's [`Control`](quarry_fetch::Control); a cancelled
//! job removes its partial install directory, a failed one keeps it.

pub mod assets;
pub mod error;
pub mod image;
pub mod installed;
pub mod key;
pub mod layout;
pub mod manifest;
pub mod metadata;
pub mod notify;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod reporter;
pub mod settings;
pub mod store;
pub mod weights;

pub use assets::{
    AssetPool, PoolProgress, RESOURCE_BASE_URL, ResourceItem, asset_threads, default_asset_threads, is_object_hash,
};
pub use error::{InstallError, ManifestError, MetadataError, NotifyError, Result};
pub use image::display_image_url;
pub use installed::{InstalledClient, scan_installed};
pub use key::{ArtifactKey, normalize_category};
pub use layout::Layout;
pub use manifest::{InstallManifest, LaunchFlag, MANIFEST_FILE};
pub use metadata::{
    Catalog, CatalogEntry, DEFAULT_CATALOG_URLS, DEFAULT_MAIN_CLASS, HttpMetadataSource, MetadataSource,
    ResourceIndex, VersionDocument,
};
pub use notify::{InstallNotifier, LogNotifier};
pub use pipeline::{CLIENT_JAR, DISPLAY_IMAGE, InstallReport, InstallRequest, Installer, JobOutcome};
pub use progress::{ProgressRecord, Stage, Status};
pub use registry::{JobRegistry, RunMode, StartOutcome};
pub use reporter::ProgressReporter;
pub use settings::Settings;
pub use store::ProgressStore;
pub use weights::StageWeights;
