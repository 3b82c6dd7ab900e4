use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::key::ArtifactKey;
use crate::progress::{ProgressRecord, Stage, Status};
use crate::store::ProgressStore;
use crate::weights::StageWeights;

/// Publishes progress for one job. Writes are best-effort: a failed write
/// is logged and never interrupts the install.
#[derive(Debug)]
pub struct ProgressReporter {
    key:     ArtifactKey,
    store:   ProgressStore,
    weights: StageWeights,
    last:    Mutex<Option<ProgressRecord>>,
}

impl ProgressReporter {
    pub fn new(key: ArtifactKey, store: ProgressStore, weights: StageWeights) -> Self {
        Self {
            key,
            store,
            weights,
            last: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }

    /// Publishes a `downloading` record for `stage` at `stage_percent`.
    ///
    /// Overall progress never moves backwards while the job is running.
    pub fn update(
        &self,
        stage: Stage,
        stage_percent: f64,
        message: impl Into<String>,
        bytes_done: u64,
        bytes_total: u64,
    ) {
        let stage_percent = stage_percent.clamp(0.0, 100.0);
        let mut overall = self.weights.overall(stage, stage_percent) as u8;

        let mut last = self.lock();
        if let Some(prev) = last.as_ref().filter(|r| !r.status.is_terminal()) {
            overall = overall.max(prev.overall_percent);
        }

        let record = ProgressRecord {
            status: Status::Downloading,
            stage,
            stage_percent: stage_percent as u8,
            overall_percent: overall,
            message: message.into(),
            bytes_done,
            bytes_total,
        };
        debug!(
            key = %self.key,
            stage = %stage,
            stage_percent = record.stage_percent,
            overall = overall,
            "{}",
            record.message
        );
        self.persist(&record);
        *last = Some(record);
    }

    /// Republishes the last record as `paused`.
    pub fn publish_paused(&self) {
        let last = self.lock();
        let record = match last.as_ref() {
            Some(record) => record.paused(),
            None => ProgressRecord {
                status:          Status::Paused,
                stage:           Stage::VersionMetadata,
                stage_percent:   0,
                overall_percent: 0,
                message:         "Paused".to_string(),
                bytes_done:      0,
                bytes_total:     0,
            },
        };
        self.persist(&record);
    }

    /// Writes an `error` record at the last published position.
    pub fn fail(&self, message: impl Into<String>) {
        let mut last = self.lock();
        let record = match last.as_ref() {
            Some(record) => record.failed_here(message),
            None => ProgressRecord::failed(message),
        };
        self.persist(&record);
        *last = Some(record);
    }

    /// Writes a terminal record.
    pub fn finish(&self, record: ProgressRecord) {
        let mut last = self.lock();
        self.persist(&record);
        *last = Some(record);
    }

    pub fn last(&self) -> Option<ProgressRecord> {
        self.lock().clone()
    }

    fn persist(&self, record: &ProgressRecord) {
        if let Err(e) = self.store.write(&self.key, record) {
            warn!(key = %self.key, error = %e, "failed to persist progress");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressRecord>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter(dir: &std::path::Path) -> ProgressReporter {
        ProgressReporter::new(
            ArtifactKey::release("1.20.1").unwrap(),
            ProgressStore::new(dir),
            StageWeights::default(),
        )
    }

    #[test]
    fn update_persists_weighted_record() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = reporter(dir.path());
        reporter.update(Stage::Client, 50.0, "Downloading client.jar...", 10, 100);

        let stored = ProgressStore::new(dir.path()).read(reporter.key()).unwrap();
        assert_eq!(stored.status, Status::Downloading);
        assert_eq!(stored.stage_percent, 50);
        assert_eq!(stored.overall_percent, 15);
        assert_eq!(stored.bytes_done, 10);
    }

    #[test]
    fn overall_never_regresses() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = reporter(dir.path());
        reporter.update(Stage::Libraries, 80.0, "a", 0, 0);
        reporter.update(Stage::Libraries, 40.0, "b", 0, 0);
        assert_eq!(reporter.last().unwrap().overall_percent, 45);
    }

    #[test]
    fn paused_republishes_last_position() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = reporter(dir.path());
        reporter.update(Stage::Natives, 20.0, "Natives 1/5", 7, 9);
        reporter.publish_paused();

        let stored = ProgressStore::new(dir.path()).read(reporter.key()).unwrap();
        assert_eq!(stored.status, Status::Paused);
        assert_eq!(stored.stage, Stage::Natives);
        assert_eq!(stored.bytes_done, 7);
        // the in-memory record is untouched so later updates continue from it
        assert_eq!(reporter.last().unwrap().status, Status::Downloading);
    }

    #[test]
    fn failure_is_recorded_at_the_failing_stage() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = reporter(dir.path());
        reporter.update(Stage::Libraries, 50.0, "Libraries 2/4", 40, 90);
        reporter.fail("checksum mismatch");

        let stored = ProgressStore::new(dir.path()).read(reporter.key()).unwrap();
        assert_eq!(stored.status, Status::Error);
        assert_eq!(stored.stage, Stage::Libraries);
        assert_eq!(stored.overall_percent, 37);
        assert_eq!(stored.bytes_done, 40);
        assert_eq!(stored.message, "checksum mismatch");
    }

    #[test]
    fn unwritable_store_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let reporter = reporter(&blocker.join("progress"));
        reporter.update(Stage::Client, 10.0, "still running", 0, 0);
        assert_eq!(reporter.last().unwrap().stage_percent, 10);
    }
}
