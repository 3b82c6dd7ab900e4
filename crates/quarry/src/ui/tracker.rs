use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use quarry_install::{ProgressRecord, Status};

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>16.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos:>3}% {msg:40}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(style) => style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(style)
});

/// Draws a job's overall percentage from its progress records.
pub struct InstallTracker {
    pb: ProgressBar,
}

impl InstallTracker {
    pub fn new(prefix: &str) -> Self {
        let pb = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(prefix.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }

    pub fn update(&self, record: &ProgressRecord) {
        self.pb.set_position(u64::from(record.overall_percent));
        match record.status {
            Status::Paused => self.pb.set_message(format!("paused: {}", record.message)),
            _ => self.pb.set_message(format!("{}: {}", record.stage, record.message)),
        }
    }

    pub fn finish(self, record: &ProgressRecord) {
        match record.status {
            Status::Installed => {
                self.pb.set_position(100);
                self.pb.finish_with_message("installed");
            }
            status => self.pb.abandon_with_message(format!("{status}: {}", record.message)),
        }
    }
}
