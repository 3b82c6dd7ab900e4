//! Bounded worker pool for content-addressed resources.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use quarry_fetch::{Control, FetchRequest, Fetcher};
use quarry_verify::Checksum;
use tracing::{debug, warn};

use crate::error::{InstallError, Result};
use crate::layout::Layout;
use crate::metadata::ResourceIndex;

pub const RESOURCE_BASE_URL: &str = "https://resources.download.minecraft.net";

/// Worker count for a machine with `cpus` logical CPUs.
pub fn asset_threads(cpus: usize) -> usize {
    match cpus {
        12.. => 16,
        6.. => 8,
        _ => 4,
    }
}

pub fn default_asset_threads() -> usize {
    asset_threads(std::thread::available_parallelism().map_or(1, |n| n.get()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub key:  String,
    pub hash: String,
    pub size: u64,
}

impl ResourceItem {
    pub fn from_index(index: &ResourceIndex) -> Vec<Self> {
        index
            .objects
            .iter()
            .map(|(key, object)| Self {
                key:  key.clone(),
                hash: object.hash.clone(),
                size: object.size,
            })
            .collect()
    }
}

/// Completed-key counters shared by all workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolProgress {
    pub done:  usize,
    pub total: usize,
    pub bytes: u64,
}

impl PoolProgress {
    pub fn percent(&self) -> f64 {
        self.done as f64 * 100.0 / self.total.max(1) as f64
    }
}

/// A SHA-1 object name: exactly 40 hex digits, usable as a path segment.
pub fn is_object_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Splits `items` round-robin into at most `workers` non-empty shards.
pub fn shard<T>(items: &[T], workers: usize) -> Vec<Vec<&T>> {
    let workers = workers.max(1);
    let mut shards: Vec<Vec<&T>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, item) in items.iter().enumerate() {
        shards[i % workers].push(item);
    }
    shards.retain(|s| !s.is_empty());
    shards
}

/// Downloads resources into the object store with a fixed number of threads.
pub struct AssetPool<'a> {
    fetcher:       &'a Fetcher,
    layout:        &'a Layout,
    threads:       usize,
    base_url:      &'a str,
    verify_cached: bool,
}

impl<'a> AssetPool<'a> {
    pub fn new(fetcher: &'a Fetcher, layout: &'a Layout) -> Self {
        Self {
            fetcher,
            layout,
            threads: default_asset_threads(),
            base_url: RESOURCE_BASE_URL,
            verify_cached: false,
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = base_url;
        self
    }

    /// Re-hash objects already on disk instead of trusting their presence.
    pub fn verify_cached(mut self, verify: bool) -> Self {
        self.verify_cached = verify;
        self
    }

    pub fn object_url(&self, hash: &str) -> String {
        let shard = hash.get(..2).unwrap_or(hash);
        format!("{}/{shard}/{hash}", self.base_url.trim_end_matches('/'))
    }

    /// Processes every item, calling `on_complete` under the shared lock after each one.
    ///
    /// Workers stop at their next key once the job is cancelled or another
    /// worker has failed; the first failure is returned.
    pub fn run(
        &self,
        items: &[ResourceItem],
        control: &Control,
        on_complete: &(dyn Fn(PoolProgress) + Sync),
    ) -> Result<PoolProgress> {
        let checksums = items
            .iter()
            .map(|item| {
                let invalid = || InstallError::InvalidResourceHash {
                    key:  item.key.clone(),
                    hash: item.hash.clone(),
                };
                if !is_object_hash(&item.hash) {
                    return Err(invalid());
                }
                Checksum::parse(&item.hash).map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>>>()?;
        let work: Vec<(&ResourceItem, Checksum)> = items.iter().zip(checksums).collect();

        let progress = Mutex::new(PoolProgress {
            done:  0,
            total: items.len(),
            bytes: 0,
        });
        let failure: Mutex<Option<InstallError>> = Mutex::new(None);
        let stop = AtomicBool::new(false);
        let shards = shard(&work, self.threads);
        debug!(items = items.len(), workers = shards.len(), "resource pool started");

        std::thread::scope(|scope| {
            for shard in &shards {
                let (progress, failure, stop) = (&progress, &failure, &stop);
                scope.spawn(move || {
                    for (item, checksum) in shard.iter().copied() {
                        if stop.load(Ordering::SeqCst) {
                            return;
                        }
                        if let Err(e) = self.process(item, checksum, control) {
                            stop.store(true, Ordering::SeqCst);
                            let mut slot = failure.lock().unwrap_or_else(PoisonError::into_inner);
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            return;
                        }
                        let mut p = progress.lock().unwrap_or_else(PoisonError::into_inner);
                        p.done += 1;
                        p.bytes += item.size;
                        on_complete(*p);
                    }
                });
            }
        });

        if control.is_cancelled() {
            return Err(InstallError::Cancelled);
        }
        if let Some(e) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(e);
        }
        Ok(progress.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    fn process(&self, item: &ResourceItem, checksum: &Checksum, control: &Control) -> Result<()> {
        control.checkpoint()?;

        let path = self.layout.asset_object(&item.hash);
        if path.exists() && self.is_reusable(&path, checksum) {
            return Ok(());
        }

        let request = FetchRequest::new(self.object_url(&item.hash), &path)
            .checksum(Some(checksum.clone()))
            .size(Some(item.size));
        self.fetcher.fetch(&request, None, Some(control))?;
        Ok(())
    }

    fn is_reusable(&self, path: &std::path::Path, checksum: &Checksum) -> bool {
        if !self.verify_cached {
            return true;
        }
        match checksum.verify_file(path) {
            Ok(true) => true,
            Ok(false) => {
                warn!(path = %path.display(), "cached resource failed verification, refetching");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cached resource unreadable, refetching");
                false
            }
        }
    }
}
