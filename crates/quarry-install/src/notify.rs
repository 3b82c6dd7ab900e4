//! Completion notification.
//!
//! Notifiers run once per successful install. They are cosmetic: any error
//! they return is logged and dropped.

use tracing::info;

use crate::error::NotifyError;
use crate::pipeline::InstallReport;

pub trait InstallNotifier: Send + Sync {
    /// Name used when logging a failed notification.
    fn name(&self) -> &'static str;

    fn installed(&self, _report: &InstallReport) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Emits an `info` event for every completed install.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl InstallNotifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn installed(&self, report: &InstallReport) -> Result<(), NotifyError> {
        info!(
            key = %report.key,
            dir = %report.install_dir.display(),
            bytes = report.bytes_total,
            "[{}] installation complete",
            report.key.id()
        );
        Ok(())
    }
}
