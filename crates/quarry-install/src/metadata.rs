//! Version catalog and version document model.

use std::collections::BTreeMap;

use quarry_fetch::{Control, Fetcher};
use quarry_verify::Checksum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MetadataError;

pub const DEFAULT_CATALOG_URLS: [&str; 2] = [
    "https://piston-meta.mojang.com/mc/game/version_manifest.json",
    "https://launchermeta.mojang.com/mc/game/version_manifest.json",
];

pub const DEFAULT_MAIN_CLASS: &str = "net.minecraft.client.Minecraft";

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub versions: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id:   String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url:  String,
}

/// A remote file declared by the version document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Download {
    #[serde(default)]
    pub url:  String,
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: u64,
    /// Relative cache path; absent for the client binary.
    pub path: Option<String>,
}

impl Download {
    /// Declared digest, if any. Malformed digests are ignored.
    pub fn checksum(&self) -> Option<Checksum> {
        self.sha1.as_deref().and_then(|h| Checksum::parse(h).ok())
    }

    /// Usable when it names both a URL and a cache path.
    pub fn cache_path(&self) -> Option<&str> {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() && !self.url.is_empty() => Some(path),
            _ => None,
        }
    }

    /// Last segment of the declared path.
    pub fn file_name(&self) -> Option<&str> {
        let path = self.path.as_deref()?;
        path.rsplit('/').next().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientDownloads {
    pub client: Option<Download>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    pub artifact:    Option<Download>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, Download>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub name:      String,
    #[serde(default)]
    pub downloads: LibraryDownloads,
    pub extract:   Option<ExtractRules>,
}

impl Library {
    pub fn exclusions(&self) -> &[String] {
        self.extract.as_ref().map(|e| e.exclude.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    #[serde(default)]
    pub id:         String,
    #[serde(default)]
    pub url:        String,
    pub sha1:       Option<String>,
    #[serde(default)]
    pub size:       u64,
    #[serde(default)]
    pub total_size: u64,
}

impl AssetIndexRef {
    pub fn checksum(&self) -> Option<Checksum> {
        self.sha1.as_deref().and_then(|h| Checksum::parse(h).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
}

/// The per-version document referenced by a catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDocument {
    #[serde(default)]
    pub id:                  String,
    #[serde(rename = "type", default)]
    pub kind:                String,
    pub main_class:          Option<String>,
    #[serde(default)]
    pub downloads:           ClientDownloads,
    #[serde(default)]
    pub libraries:           Vec<Library>,
    pub asset_index:         Option<AssetIndexRef>,
    pub arguments:           Option<Arguments>,
    pub minecraft_arguments: Option<String>,
}

impl VersionDocument {
    pub fn main_class(&self) -> &str {
        self.main_class.as_deref().filter(|c| !c.is_empty()).unwrap_or(DEFAULT_MAIN_CLASS)
    }

    pub fn client(&self) -> Option<&Download> {
        self.downloads.client.as_ref().filter(|c| !c.url.is_empty())
    }

    /// Client, library and native sizes; resources are not included.
    pub fn declared_bytes(&self) -> u64 {
        let client = self.downloads.client.as_ref().map_or(0, |c| c.size);
        let libraries: u64 = self
            .libraries
            .iter()
            .map(|lib| {
                let artifact = lib.downloads.artifact.as_ref().map_or(0, |a| a.size);
                let natives: u64 = lib.downloads.classifiers.values().map(|n| n.size).sum();
                artifact + natives
            })
            .sum();
        client + libraries
    }

    pub fn native_count(&self) -> usize {
        self.libraries.iter().map(|lib| lib.downloads.classifiers.len()).sum()
    }

    /// Game arguments joined by spaces.
    ///
    /// Structured `arguments.game` wins; string items and `{ "value": ... }`
    /// objects contribute, rule conditions are ignored. Falls back to the
    /// flat `minecraftArguments` string.
    pub fn extra_args(&self) -> Option<String> {
        if let Some(arguments) = &self.arguments {
            let mut flat = Vec::new();
            for item in &arguments.game {
                match item {
                    serde_json::Value::String(s) => flat.push(s.as_str()),
                    serde_json::Value::Object(obj) => match obj.get("value") {
                        Some(serde_json::Value::String(s)) => flat.push(s.as_str()),
                        Some(serde_json::Value::Array(values)) => {
                            flat.extend(values.iter().filter_map(|v| v.as_str()));
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
            if !flat.is_empty() {
                return Some(flat.join(" "));
            }
        }

        self.minecraft_arguments
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// A resource index: logical key to content-addressed object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceIndex {
    #[serde(default)]
    pub objects: BTreeMap<String, ResourceObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceObject {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl ResourceIndex {
    pub fn total_size(&self) -> u64 {
        self.objects.values().map(|o| o.size).sum()
    }
}

/// Where version metadata comes from.
pub trait MetadataSource: Send + Sync {
    /// Finds the catalog entry for `id`.
    fn resolve(&self, id: &str, control: &Control) -> Result<CatalogEntry, MetadataError>;

    /// Downloads and parses the document at `url`.
    fn fetch_document(&self, url: &str, control: &Control) -> Result<VersionDocument, MetadataError>;
}

/// Reads the catalog over HTTP, trying each catalog URL in turn.
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    fetcher:      Fetcher,
    catalog_urls: Vec<String>,
}

impl HttpMetadataSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            catalog_urls: DEFAULT_CATALOG_URLS.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub fn with_catalog_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    fn catalog(&self, control: &Control) -> Result<Catalog, MetadataError> {
        for url in &self.catalog_urls {
            match self.fetcher.fetch_json::<Catalog>(url, Some(control)) {
                Ok(catalog) => {
                    debug!(url = %url, versions = catalog.versions.len(), "catalog loaded");
                    return Ok(catalog);
                }
                Err(e) if e.is_interrupted() => return Err(MetadataError::Interrupted),
                Err(e) => warn!(url = %url, error = %e, "catalog source failed"),
            }
        }
        Err(MetadataError::CatalogUnavailable {
            tried: self.catalog_urls.len(),
        })
    }
}

impl MetadataSource for HttpMetadataSource {
    fn resolve(&self, id: &str, control: &Control) -> Result<CatalogEntry, MetadataError> {
        let catalog = self.catalog(control)?;
        let entry = catalog
            .versions
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| MetadataError::UnknownVersion(id.to_string()))?;
        if entry.url.is_empty() {
            return Err(MetadataError::MissingUrl(id.to_string()));
        }
        Ok(entry)
    }

    fn fetch_document(&self, url: &str, control: &Control) -> Result<VersionDocument, MetadataError> {
        self.fetcher.fetch_json(url, Some(control)).map_err(|e| {
            if e.is_interrupted() {
                MetadataError::Interrupted
            } else {
                MetadataError::Document {
                    url:    url.to_string(),
                    source: e,
                }
            }
        })
    }
}
