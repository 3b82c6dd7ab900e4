//! Process-wide table of running install jobs.
//!
//! At most one job per [`ArtifactKey`]. A job's entry exists from the moment
//! it is started until its worker returns, whatever the outcome; pause,
//! resume and cancel only flip flags on the job's [`Control`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use quarry_fetch::Control;
use tracing::{debug, info, warn};

use crate::error::{InstallError, Result};
use crate::key::ArtifactKey;
use crate::pipeline::{InstallRequest, Installer, JobOutcome};
use crate::progress::{ProgressRecord, Status};
use crate::store::ProgressStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Spawn a worker thread and return immediately.
    Background,
    /// Run on the calling thread until the job ends.
    Foreground,
}

#[derive(Debug)]
pub enum StartOutcome {
    Spawned,
    AlreadyRunning,
    Finished(JobOutcome),
}

struct Job {
    control:    Control,
    generation: u64,
    handle:     Option<JoinHandle<JobOutcome>>,
}

struct Inner {
    installer:     Installer,
    jobs:          Mutex<HashMap<ArtifactKey, Job>>,
    generation:    AtomicU64,
    poll_interval: Duration,
}

impl Inner {
    fn jobs(&self) -> MutexGuard<'_, HashMap<ArtifactKey, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the job's entry when its worker ends, unless a newer job owns the key.
struct FinishGuard {
    inner:      Arc<Inner>,
    key:        ArtifactKey,
    generation: u64,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let mut jobs = self.inner.jobs();
        if jobs.get(&self.key).is_some_and(|job| job.generation == self.generation) {
            jobs.remove(&self.key);
            debug!(key = %self.key, "job entry released");
        }
    }
}

#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("running", &self.running())
            .finish_non_exhaustive()
    }
}

impl JobRegistry {
    pub fn new(installer: Installer) -> Self {
        Self::with_poll_interval(installer, Control::DEFAULT_POLL_INTERVAL)
    }

    /// `poll_interval` is how often a paused job rechecks its flags.
    pub fn with_poll_interval(installer: Installer, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                installer,
                jobs: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                poll_interval,
            }),
        }
    }

    pub fn installer(&self) -> &Installer {
        &self.inner.installer
    }

    pub fn store(&self) -> ProgressStore {
        self.inner.installer.store()
    }

    /// Starts a job unless one is already running for the same key.
    pub fn start(&self, request: InstallRequest, mode: RunMode) -> Result<StartOutcome> {
        let key = request.key.clone();
        let mut jobs = self.inner.jobs();
        if jobs.contains_key(&key) {
            info!(key = %key, "install already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let control = Control::with_poll_interval(self.inner.poll_interval);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst);
        jobs.insert(key.clone(), Job {
            control: control.clone(),
            generation,
            handle: None,
        });

        match mode {
            RunMode::Foreground => {
                drop(jobs);
                let _guard = FinishGuard {
                    inner: Arc::clone(&self.inner),
                    key,
                    generation,
                };
                Ok(StartOutcome::Finished(self.inner.installer.execute(&request, &control)))
            }
            RunMode::Background => {
                let inner = Arc::clone(&self.inner);
                let guard_key = key.clone();
                let spawned = thread::Builder::new()
                    .name(format!("install {key}"))
                    .spawn(move || {
                        let _guard = FinishGuard {
                            inner: Arc::clone(&inner),
                            key: guard_key,
                            generation,
                        };
                        inner.installer.execute(&request, &control)
                    });

                match spawned {
                    Ok(handle) => {
                        if let Some(job) = jobs.get_mut(&key) {
                            job.handle = Some(handle);
                        }
                        Ok(StartOutcome::Spawned)
                    }
                    Err(e) => {
                        jobs.remove(&key);
                        warn!(key = %key, error = %e, "failed to spawn install worker");
                        Err(InstallError::Spawn(e))
                    }
                }
            }
        }
    }

    /// Convenience entry point taking the raw id and category name.
    pub fn install(&self, id: &str, category: &str, full_resources: bool, background: bool) -> Result<StartOutcome> {
        let request = InstallRequest::new(ArtifactKey::new(id, category)?, full_resources);
        let mode = if background { RunMode::Background } else { RunMode::Foreground };
        self.start(request, mode)
    }

    /// Returns `false` when no job is running for `key`.
    pub fn cancel(&self, key: &ArtifactKey) -> bool {
        self.with_control(key, |control| {
            info!(key = %key, "cancel requested");
            control.cancel();
        })
    }

    pub fn pause(&self, key: &ArtifactKey) -> bool {
        self.with_control(key, |control| {
            info!(key = %key, "pause requested");
            control.pause();
        })
    }

    pub fn resume(&self, key: &ArtifactKey) -> bool {
        self.with_control(key, |control| {
            info!(key = %key, "resume requested");
            control.resume();
        })
    }

    pub fn is_running(&self, key: &ArtifactKey) -> bool {
        self.inner.jobs().contains_key(key)
    }

    pub fn running(&self) -> Vec<ArtifactKey> {
        let mut keys: Vec<_> = self.inner.jobs().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Last persisted record, shown as `paused` while the job's pause flag is set.
    pub fn get_status(&self, key: &ArtifactKey) -> Option<ProgressRecord> {
        let mut record = self.store().read(key)?;
        let paused = self.inner.jobs().get(key).is_some_and(|job| job.control.is_paused());
        if paused && !record.status.is_terminal() {
            record.status = Status::Paused;
        }
        Some(record)
    }

    /// Waits for a background job. `None` if no joinable job exists for `key`.
    pub fn join(&self, key: &ArtifactKey) -> Option<JobOutcome> {
        let handle = self.inner.jobs().get_mut(key)?.handle.take()?;
        match handle.join() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(key = %key, "install worker panicked");
                None
            }
        }
    }

    fn with_control(&self, key: &ArtifactKey, f: impl FnOnce(&Control)) -> bool {
        match self.inner.jobs().get(key) {
            Some(job) => {
                f(&job.control);
                true
            }
            None => false,
        }
    }
}
