use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quarry_install::{Layout, ProgressRecord, Status};

pub mod config;
pub mod install;
pub mod ls;
pub mod status;

#[derive(Debug, Parser)]
#[command(name = "quarry", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Data directory [default: ~/.quarry]
    #[arg(long, global = true, env = Layout::ENV_VAR)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "i", name = "install", about = "Install a client version")]
    Install(install::InstallArg),
    #[command(alias = "st", name = "status", about = "Show the last recorded progress of an install")]
    Status(status::StatusArg),
    #[command(alias = "ls", name = "list", about = "List installed clients and recorded jobs")]
    List(ls::ListArg),
    #[command(alias = "cfg", name = "config", about = "Show or change settings")]
    Config(config::ConfigArg),
}

impl App {
    pub fn run(self) -> Result<ExitCode> {
        let layout = match self.base_dir {
            Some(dir) => Layout::new(dir),
            None => Layout::from_env()?,
        };

        match self.cmd {
            Commands::Install(arg) => arg.run(layout),
            Commands::Status(arg) => arg.run(&layout),
            Commands::List(arg) => arg.run(&layout),
            Commands::Config(arg) => arg.run(&layout),
        }
    }
}

/// Non-zero unless the record says the client is installed.
pub fn exit_code(record: &ProgressRecord) -> ExitCode {
    if record.status == Status::Installed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
