use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use quarry_install::{InstalledClient, Layout, ProgressRecord, ProgressStore, Status, scan_installed};
use tabled::Tabled;

use crate::ui::HumanBytes;
use crate::ui::table::Formatter;

#[derive(Debug, Clone, Args)]
pub struct ListArg {
    /// Also show records of jobs that finished successfully
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "Category")]
    category:  String,
    #[tabled(rename = "Version")]
    id:        String,
    #[tabled(rename = "Name")]
    name:      String,
    #[tabled(rename = "Type")]
    kind:      String,
    #[tabled(rename = "Resources")]
    resources: &'static str,
    #[tabled(rename = "Size")]
    size:      String,
}

impl From<&InstalledClient> for ClientRow {
    fn from(client: &InstalledClient) -> Self {
        Self {
            category:  client.key.category().to_string(),
            id:        client.key.id().to_string(),
            name:      client.display_name().to_string(),
            kind:      client.manifest.version_type.clone(),
            resources: if client.manifest.full_assets { "full" } else { "lite" },
            size:      HumanBytes(client.manifest.total_size_bytes).to_string(),
        }
    }
}

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "Job")]
    key:      String,
    #[tabled(rename = "Status")]
    status:   String,
    #[tabled(rename = "Stage")]
    stage:    String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Message")]
    message:  String,
}

impl ListArg {
    pub fn run(self, layout: &Layout) -> Result<ExitCode> {
        let clients = scan_installed(layout)?;
        if clients.is_empty() {
            println!("No clients installed under {}", layout.clients_dir().display());
        } else {
            let table = Formatter::default()
                .header("Installed clients")
                .build(clients.iter().map(ClientRow::from));
            println!("{table}");
        }

        let records: Vec<(String, ProgressRecord)> = ProgressStore::new(layout.progress_dir())
            .list()?
            .into_iter()
            .filter(|(_, record)| self.all || record.status != Status::Installed)
            .map(|(key, record)| (key.to_string(), record))
            .collect();
        if !records.is_empty() {
            let table = Formatter::default().header("Jobs").build(records.into_iter().map(|(key, record)| JobRow {
                key,
                status: record.status.to_string(),
                stage: record.stage.to_string(),
                progress: format!("{}%", record.overall_percent),
                message: record.message,
            }));
            println!("\n{table}");
        }

        Ok(ExitCode::SUCCESS)
    }
}
