use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use quarry_install::{ArtifactKey, Layout, ProgressStore};

use crate::cli::exit_code;
use crate::ui::HumanBytes;

#[derive(Debug, Clone, Args)]
pub struct StatusArg {
    pub id:       String,
    #[arg(short, long, default_value = "Release")]
    pub category: String,
    /// Print the raw record as JSON
    #[arg(long)]
    pub json:     bool,
}

impl StatusArg {
    pub fn run(self, layout: &Layout) -> Result<ExitCode> {
        let key = ArtifactKey::new(&self.id, &self.category)?;
        let store = ProgressStore::new(layout.progress_dir());

        let Some(record) = store.read(&key) else {
            println!("{key}: no install recorded");
            return Ok(ExitCode::FAILURE);
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            println!("{key}");
            println!("  status:   {}", record.status);
            println!("  stage:    {} ({}%)", record.stage, record.stage_percent);
            println!("  overall:  {}%", record.overall_percent);
            println!("  bytes:    {} / {}", HumanBytes(record.bytes_done), HumanBytes(record.bytes_total));
            println!("  message:  {}", record.message);
        }
        Ok(exit_code(&record))
    }
}
