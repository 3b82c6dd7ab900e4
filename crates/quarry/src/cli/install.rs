use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use quarry_fetch::ReqwestClient;
use quarry_install::{ArtifactKey, InstallRequest, Installer, JobOutcome, JobRegistry, Layout, RunMode, StartOutcome};
use tracing::info;

use crate::cli::exit_code;
use crate::ui::tracker::InstallTracker;

const REFRESH: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Args)]
pub struct InstallArg {
    /// Version id as listed in the catalog, e.g. 1.20.1
    pub id:         String,
    #[arg(short, long, default_value = "Release")]
    pub category:   String,
    /// Skip resource bodies; the game fetches them on demand
    #[arg(long)]
    pub lite:       bool,
    /// Run on this thread and log progress instead of drawing a bar
    #[arg(long)]
    pub foreground: bool,
}

impl InstallArg {
    pub fn run(self, layout: Layout) -> Result<ExitCode> {
        let client = ReqwestClient::new().context("failed to build HTTP client")?;
        let registry = JobRegistry::new(Installer::from_layout(layout, Arc::new(client)));
        let key = ArtifactKey::new(&self.id, &self.category)?;
        let request = InstallRequest::new(key.clone(), !self.lite);
        let mode = if self.foreground { RunMode::Foreground } else { RunMode::Background };

        match registry.start(request, mode)? {
            StartOutcome::Finished(outcome) => {
                print_outcome(&key, &outcome);
                Ok(match outcome {
                    JobOutcome::Installed(_) => ExitCode::SUCCESS,
                    _ => ExitCode::FAILURE,
                })
            }
            StartOutcome::AlreadyRunning => bail!("{key} is already being installed"),
            StartOutcome::Spawned => {
                info!(key = %key, "install running in background");
                let tracker = InstallTracker::new(&key.to_string());
                while registry.is_running(&key) {
                    if let Some(record) = registry.get_status(&key) {
                        tracker.update(&record);
                    }
                    thread::sleep(REFRESH);
                }

                let record = registry
                    .store()
                    .read(&key)
                    .with_context(|| format!("no progress recorded for {key}"))?;
                tracker.finish(&record);
                Ok(exit_code(&record))
            }
        }
    }
}

fn print_outcome(key: &ArtifactKey, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Installed(report) => println!("{key} installed to {}", report.install_dir.display()),
        JobOutcome::Cancelled => println!("{key}: installation cancelled"),
        JobOutcome::Failed(message) => println!("{key}: installation failed: {message}"),
    }
}
