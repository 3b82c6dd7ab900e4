//! The staged install pipeline.
//!
//! `version_metadata → client → libraries → natives → resources → finalize`,
//! strictly in order. Errors cross exactly one boundary, [`Installer::execute`],
//! where they are classified into a [`JobOutcome`] and cleanup is decided.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quarry_archive::ExtractOptions;
use quarry_fetch::{Control, FetchOptions, FetchRequest, Fetcher, HttpClient};
use quarry_verify::Checksum;
use quarry_version::{Platform, ResourceEra, SupersededRule};
use tracing::{debug, error, info, warn};

use crate::assets::{AssetPool, PoolProgress, RESOURCE_BASE_URL, ResourceItem, default_asset_threads};
use crate::error::{InstallError, Result};
use crate::image::display_image_url;
use crate::key::ArtifactKey;
use crate::layout::Layout;
use crate::manifest::InstallManifest;
use crate::metadata::{CatalogEntry, HttpMetadataSource, MetadataSource, ResourceIndex, VersionDocument};
use crate::notify::{InstallNotifier, LogNotifier};
use crate::progress::{ProgressRecord, Stage};
use crate::reporter::ProgressReporter;
use crate::settings::Settings;
use crate::store::ProgressStore;
use crate::weights::StageWeights;

pub const CLIENT_JAR: &str = "client.jar";
pub const DISPLAY_IMAGE: &str = "display.png";

type OnProgress<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub key:            ArtifactKey,
    /// Download every resource body instead of only the index.
    pub full_resources: bool,
}

impl InstallRequest {
    pub fn new(key: ArtifactKey, full_resources: bool) -> Self {
        Self { key, full_resources }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub key:         ArtifactKey,
    pub install_dir: PathBuf,
    pub manifest:    InstallManifest,
    pub bytes_done:  u64,
    pub bytes_total: u64,
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Installed(InstallReport),
    Cancelled,
    Failed(String),
}

pub struct Installer {
    layout:            Layout,
    fetcher:           Fetcher,
    metadata:          Arc<dyn MetadataSource>,
    settings:          Settings,
    weights:           StageWeights,
    notifier:          Arc<dyn InstallNotifier>,
    superseded:        Vec<String>,
    asset_threads:     Option<usize>,
    resource_base_url: String,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("layout", &self.layout)
            .field("settings", &self.settings)
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl Installer {
    pub fn new(layout: Layout, fetcher: Fetcher, metadata: Arc<dyn MetadataSource>) -> Self {
        Self {
            layout,
            fetcher,
            metadata,
            settings: Settings::default(),
            weights: StageWeights::default(),
            notifier: Arc::new(LogNotifier),
            superseded: vec!["lwjgl".to_string()],
            asset_threads: None,
            resource_base_url: RESOURCE_BASE_URL.to_string(),
        }
    }

    /// Reads `settings.toml` from the layout and routes every request
    /// through its proxy prefix.
    pub fn from_layout(layout: Layout, client: Arc<dyn HttpClient>) -> Self {
        let settings = Settings::load(layout.settings_file());
        let mut options = FetchOptions::default();
        if let Some(prefix) = settings.url_prefix() {
            options = options.url_prefix(prefix);
        }
        let fetcher = Fetcher::new(client).with_options(options);
        let metadata = Arc::new(HttpMetadataSource::new(fetcher.clone()));
        Self::new(layout, fetcher, metadata).with_settings(settings)
    }

    /// Does not touch the fetcher's proxy prefix.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_weights(mut self, weights: StageWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn InstallNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_asset_threads(mut self, threads: usize) -> Self {
        self.asset_threads = Some(threads.max(1));
        self
    }

    pub fn with_resource_base_url(mut self, url: impl Into<String>) -> Self {
        self.resource_base_url = url.into();
        self
    }

    /// Library families subject to superseded-version skipping.
    pub fn with_superseded_families<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.superseded = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> ProgressStore {
        ProgressStore::new(self.layout.progress_dir())
    }

    fn asset_threads(&self) -> usize {
        self.asset_threads
            .or(self.settings.asset_threads)
            .unwrap_or_else(default_asset_threads)
    }

    /// Runs the whole pipeline on the calling thread.
    ///
    /// Cancellation removes the partial install directory before the
    /// `cancelled` record is written; failures keep it for inspection.
    pub fn execute(&self, request: &InstallRequest, control: &Control) -> JobOutcome {
        let key = &request.key;
        let reporter = Arc::new(ProgressReporter::new(key.clone(), self.store(), self.weights.clone()));
        let hook = Arc::clone(&reporter);
        control.set_pause_hook(Arc::new(move || hook.publish_paused()));

        info!(key = %key, full_resources = request.full_resources, "install started");
        let result = self.run(request, control, &reporter);
        control.clear_pause_hook();

        match result {
            Ok(report) => {
                reporter.finish(ProgressRecord::installed(report.bytes_done, report.bytes_total));
                if let Err(e) = self.notifier.installed(&report) {
                    warn!(notifier = self.notifier.name(), error = %e, "notification failed");
                }
                JobOutcome::Installed(report)
            }
            Err(InstallError::Cancelled) => {
                let dir = self.layout.client_dir(key);
                info!(key = %key, dir = %dir.display(), "install cancelled, removing partial install");
                if let Err(e) = quarry_fs::remove_dir_if_exists(&dir) {
                    warn!(key = %key, error = %e, "failed to remove partial install");
                }
                reporter.finish(ProgressRecord::cancelled());
                JobOutcome::Cancelled
            }
            Err(e) => {
                let message = e.to_string();
                error!(key = %key, error = %message, "install failed");
                reporter.fail(message.clone());
                JobOutcome::Failed(message)
            }
        }
    }

    fn run(&self, request: &InstallRequest, control: &Control, reporter: &ProgressReporter) -> Result<InstallReport> {
        let mut run = Run {
            installer: self,
            request,
            control,
            reporter,
            dir: self.layout.client_dir(&request.key),
            bytes_done: 0,
            bytes_total: 0,
        };

        let (entry, doc) = run.version_metadata()?;
        run.client(&doc)?;
        let libraries = run.libraries(&doc)?;
        run.natives(&doc)?;
        run.resources(&doc)?;
        let manifest = run.finalize(&entry, &doc, libraries)?;

        Ok(InstallReport {
            key: request.key.clone(),
            install_dir: run.dir,
            manifest,
            bytes_done: run.bytes_done,
            bytes_total: run.bytes_total,
        })
    }
}

/// State of one pipeline run.
struct Run<'a> {
    installer:   &'a Installer,
    request:     &'a InstallRequest,
    control:     &'a Control,
    reporter:    &'a ProgressReporter,
    dir:         PathBuf,
    bytes_done:  u64,
    bytes_total: u64,
}

impl Run<'_> {
    fn id(&self) -> &str {
        self.request.key.id()
    }

    fn report(&self, stage: Stage, percent: f64, message: impl Into<String>) {
        self.reporter.update(stage, percent, message, self.bytes_done, self.bytes_total);
    }

    fn version_metadata(&mut self) -> Result<(CatalogEntry, VersionDocument)> {
        self.report(Stage::VersionMetadata, 0.0, "Fetching version metadata...");

        let metadata = &self.installer.metadata;
        let entry = metadata.resolve(self.id(), self.control)?;
        let doc = metadata.fetch_document(&entry.url, self.control)?;

        self.bytes_total = doc.declared_bytes() + self.cached_resource_bytes(&doc);
        self.report(Stage::VersionMetadata, 100.0, "Version metadata loaded");

        std::fs::create_dir_all(&self.dir).map_err(|e| InstallError::io(&self.dir, e))?;
        self.control.checkpoint()?;
        Ok((entry, doc))
    }

    /// Size of the resource bodies according to a previously cached index.
    fn cached_resource_bytes(&self, doc: &VersionDocument) -> u64 {
        if !self.request.full_resources || !ResourceEra::of(self.id()).is_modern() {
            return 0;
        }
        let Some(index) = doc.asset_index.as_ref() else {
            return 0;
        };
        let Ok(path) = self.installer.layout.asset_index(&index.id) else {
            return 0;
        };
        std::fs::read(path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<ResourceIndex>(&bytes).ok())
            .map_or(0, |index| index.total_size())
    }

    fn client(&mut self, doc: &VersionDocument) -> Result<()> {
        let client = doc.client().ok_or(InstallError::MissingField("downloads.client"))?;
        self.report(Stage::Client, 0.0, "Downloading client.jar...");
        info!(key = %self.request.key, bytes = client.size, "downloading client");

        let (reporter, base, total, size) = (self.reporter, self.bytes_done, self.bytes_total, client.size);
        let on_progress: OnProgress<'_> = &|done, len| {
            let percent = match len {
                Some(len) if len > 0 => done as f64 * 100.0 / len as f64,
                _ => 0.0,
            };
            reporter.update(Stage::Client, percent, "Downloading client.jar...", base + done.min(size), total);
        };

        let request = FetchRequest::new(&client.url, self.dir.join(CLIENT_JAR))
            .checksum(client.checksum())
            .size(Some(client.size).filter(|s| *s > 0));
        self.installer.fetcher.fetch(&request, Some(on_progress), Some(self.control))?;

        self.bytes_done += client.size;
        self.report(Stage::Client, 100.0, "client.jar downloaded");
        Ok(())
    }

    fn libraries(&mut self, doc: &VersionDocument) -> Result<Vec<String>> {
        let total = doc.libraries.len();
        let mut installed: Vec<String> = Vec::new();
        if total == 0 {
            self.report(Stage::Libraries, 100.0, "No libraries to download");
            return Ok(installed);
        }

        let rule = SupersededRule::new(self.installer.superseded.iter().map(String::as_str)).with_names(
            doc.libraries
                .iter()
                .filter_map(|lib| lib.downloads.artifact.as_ref()?.file_name()),
        );
        info!(key = %self.request.key, libraries = total, "installing libraries");

        for (index, library) in doc.libraries.iter().enumerate() {
            self.control.checkpoint()?;

            let artifact = library.downloads.artifact.as_ref();
            let name = artifact.and_then(|a| a.file_name());
            if let (Some(artifact), Some(name), Some(path)) = (artifact, name, artifact.and_then(|a| a.cache_path())) {
                if rule.is_superseded(name) {
                    debug!(library = name, "skipping superseded library");
                } else {
                    let cache = self.installer.layout.library_path(path)?;
                    let percent = index as f64 * 100.0 / total as f64;
                    let message = format!("Downloading library {}/{}", index + 1, total);
                    let (reporter, base, bytes_total, size) =
                        (self.reporter, self.bytes_done, self.bytes_total, artifact.size);
                    let on_progress: OnProgress<'_> = &|done, _| {
                        reporter.update(Stage::Libraries, percent, message.as_str(), base + done.min(size), bytes_total);
                    };

                    self.reuse_or_fetch(&artifact.url, artifact.checksum(), artifact.size, &cache, Some(on_progress))?;
                    self.bytes_done += artifact.size;

                    self.control.checkpoint()?;
                    quarry_fs::copy_file(&cache, self.dir.join(name))?;
                    if !installed.iter().any(|n| n == name) {
                        installed.push(name.to_string());
                    }
                }
            }

            let done = index + 1;
            self.report(
                Stage::Libraries,
                done as f64 * 100.0 / total as f64,
                format!("Libraries {done}/{total}"),
            );
        }

        self.report(Stage::Libraries, 100.0, "Libraries downloaded");
        Ok(installed)
    }

    fn natives(&mut self, doc: &VersionDocument) -> Result<()> {
        let total = doc.native_count();
        if total == 0 {
            self.report(Stage::Natives, 100.0, "No natives to download");
            return Ok(());
        }
        info!(key = %self.request.key, natives = total, "installing natives");

        let mut done = 0usize;
        for library in &doc.libraries {
            for (classifier, native) in &library.downloads.classifiers {
                self.control.checkpoint()?;

                if let Some(path) = native.cache_path() {
                    let cache = self.installer.layout.library_path(path)?;
                    let percent = done as f64 * 100.0 / total as f64;
                    let message = format!("Downloading natives {}/{}", done + 1, total);
                    let (reporter, base, bytes_total, size) =
                        (self.reporter, self.bytes_done, self.bytes_total, native.size);
                    let on_progress: OnProgress<'_> = &|received, _| {
                        reporter.update(Stage::Natives, percent, message.as_str(), base + received.min(size), bytes_total);
                    };

                    self.reuse_or_fetch(&native.url, native.checksum(), native.size, &cache, Some(on_progress))?;
                    self.bytes_done += native.size;

                    let platform = Platform::from_classifier(classifier);
                    let target = self.dir.join("native").join(platform.as_str());
                    self.extract(&cache, &target, library.exclusions())?;
                }

                done += 1;
                self.report(
                    Stage::Natives,
                    done as f64 * 100.0 / total as f64,
                    format!("Natives {done}/{total}"),
                );
            }
        }

        self.report(Stage::Natives, 100.0, "Natives downloaded");
        Ok(())
    }

    fn resources(&mut self, doc: &VersionDocument) -> Result<()> {
        if !ResourceEra::of(self.id()).is_modern() {
            self.report(Stage::Resources, 100.0, "Resources ship with the client");
            return Ok(());
        }
        let Some(index_ref) = doc.asset_index.as_ref().filter(|i| !i.url.is_empty() && !i.id.is_empty()) else {
            self.report(Stage::Resources, 100.0, "No resources required");
            return Ok(());
        };

        self.report(Stage::Resources, 0.0, "Downloading resource index...");
        let index_path = self.installer.layout.asset_index(&index_ref.id)?;
        self.reuse_or_fetch(&index_ref.url, index_ref.checksum(), index_ref.size, &index_path, None)?;

        let bytes = std::fs::read(&index_path).map_err(|e| InstallError::io(&index_path, e))?;
        let index: ResourceIndex =
            serde_json::from_slice(&bytes).map_err(|source| InstallError::ResourceIndex {
                path: index_path.clone(),
                source,
            })?;

        if !self.request.full_resources {
            self.report(Stage::Resources, 100.0, "Resources will be fetched by the game at runtime");
            return Ok(());
        }

        let items = ResourceItem::from_index(&index);
        self.bytes_total = self.bytes_done + index.total_size();
        if items.is_empty() {
            self.report(Stage::Resources, 100.0, "No resources to download");
            return Ok(());
        }

        let installer = self.installer;
        let threads = installer.asset_threads();
        info!(key = %self.request.key, resources = items.len(), threads, "downloading resources");

        let pool = AssetPool::new(&installer.fetcher, &installer.layout)
            .threads(threads)
            .base_url(&installer.resource_base_url)
            .verify_cached(installer.settings.verify_cached_resources);
        let (reporter, base, bytes_total) = (self.reporter, self.bytes_done, self.bytes_total);
        let on_complete = move |p: PoolProgress| {
            reporter.update(
                Stage::Resources,
                p.percent(),
                format!("Resources {}/{}", p.done, p.total),
                base + p.bytes,
                bytes_total,
            );
        };
        let progress = pool.run(&items, self.control, &on_complete)?;

        self.bytes_done += progress.bytes;
        self.report(Stage::Resources, 100.0, "Resources downloaded");
        Ok(())
    }

    fn finalize(&mut self, entry: &CatalogEntry, doc: &VersionDocument, libraries: Vec<String>) -> Result<InstallManifest> {
        self.control.checkpoint()?;
        let kind = if entry.kind.is_empty() { doc.kind.as_str() } else { entry.kind.as_str() };

        if let Some(url) = display_image_url(self.id(), kind, self.installer.settings.low_data_mode) {
            self.report(Stage::Finalize, 0.0, "Downloading display image...");
            let request = FetchRequest::new(url, self.dir.join(DISPLAY_IMAGE));
            match self.installer.fetcher.fetch(&request, None, Some(self.control)) {
                Ok(_) => {}
                Err(e) if e.is_interrupted() => return Err(InstallError::Cancelled),
                Err(e) => debug!(error = %e, "display image unavailable"),
            }
        }

        self.report(Stage::Finalize, 50.0, "Writing metadata...");
        let mut classpath = vec![CLIENT_JAR.to_string()];
        classpath.extend(libraries.into_iter().filter(|name| name != CLIENT_JAR));

        let manifest = InstallManifest {
            main_class: doc.main_class().to_string(),
            classpath,
            asset_index: doc.asset_index.as_ref().map(|i| i.id.clone()).unwrap_or_default(),
            version_type: kind.to_string(),
            full_assets: self.request.full_resources,
            total_size_bytes: self.bytes_total,
            extra_args: doc.extra_args(),
            ..InstallManifest::default()
        };
        manifest.write_to(&self.dir)?;

        self.report(Stage::Finalize, 100.0, "Installation complete");
        Ok(manifest)
    }

    /// Keeps a cached copy whose digest matches, otherwise downloads it.
    fn reuse_or_fetch(
        &self,
        url: &str,
        checksum: Option<Checksum>,
        size: u64,
        cache: &Path,
        on_progress: Option<OnProgress<'_>>,
    ) -> Result<()> {
        if let Some(checksum) = &checksum {
            if cache.exists() && checksum.verify_file(cache).unwrap_or(false) {
                debug!(path = %cache.display(), "cache hit");
                return Ok(());
            }
        }
        let request = FetchRequest::new(url, cache)
            .checksum(checksum)
            .size(Some(size).filter(|s| *s > 0));
        self.installer.fetcher.fetch(&request, on_progress, Some(self.control))?;
        Ok(())
    }

    fn extract(&self, archive: &Path, target: &Path, exclusions: &[String]) -> Result<()> {
        let control = self.control.clone();
        let options = exclusions
            .iter()
            .fold(ExtractOptions::default(), |options, prefix| options.exclude(prefix.clone()))
            .on_entry(Arc::new(move |_: &Path| {
                if control.checkpoint().is_ok() {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            }));

        let report = quarry_archive::extract_zip_file(archive, target, &options)
            .map_err(|e| InstallError::extract(archive, e))?;
        debug!(archive = %archive.display(), entries = report.entry_count, "natives extracted");
        Ok(())
    }
}
