//! Cooperative cancellation and pause.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Invoked on every poll while a checkpoint is blocked on pause.
pub type PauseHook = Arc<dyn Fn() + Send + Sync>;

/// Returned by a checkpoint once cancellation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Interrupted;

/// Shared cancel/pause flags for one job.
///
/// Clones observe the same flags. Worker code calls [`Control::checkpoint`]
/// at every chunk, key or archive entry.
#[derive(Clone)]
pub struct Control {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled:     AtomicBool,
    paused:        AtomicBool,
    poll_interval: Duration,
    on_pause:      Mutex<Option<PauseHook>>,
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("cancelled", &self.is_cancelled())
            .field("paused", &self.is_paused())
            .field("poll_interval", &self.inner.poll_interval)
            .finish()
    }
}

impl Control {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

    pub fn new() -> Self {
        Self::with_poll_interval(Self::DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                poll_interval,
                on_pause: Mutex::new(None),
            }),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Requests cancellation. A paused holder is released so it can observe it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.paused.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    pub fn set_pause_hook(&self, hook: PauseHook) {
        *self.lock_hook() = Some(hook);
    }

    pub fn clear_pause_hook(&self) {
        *self.lock_hook() = None;
    }

    /// Fails fast on cancellation and blocks while paused.
    pub fn checkpoint(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted);
        }
        while self.is_paused() {
            let hook = self.lock_hook().clone();
            if let Some(hook) = hook {
                hook();
            }
            std::thread::sleep(self.inner.poll_interval);
            if self.is_cancelled() {
                return Err(Interrupted);
            }
        }
        if self.is_cancelled() {
            return Err(Interrupted);
        }
        Ok(())
    }

    /// Sleeps for `duration`, waking early on cancellation.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        loop {
            self.checkpoint()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(self.inner.poll_interval));
        }
    }

    fn lock_hook(&self) -> std::sync::MutexGuard<'_, Option<PauseHook>> {
        self.inner.on_pause.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
