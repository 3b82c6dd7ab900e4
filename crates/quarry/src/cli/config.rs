use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use quarry_install::{Layout, Settings};

#[derive(Debug, Clone, Args)]
pub struct ConfigArg {
    /// Prefix prepended to every download URL; pass "" to clear
    #[arg(long)]
    pub proxy:         Option<String>,
    /// Download the smaller display image
    #[arg(long)]
    pub low_data:      Option<bool>,
    /// Re-hash cached resources instead of trusting their presence
    #[arg(long)]
    pub verify_cached: Option<bool>,
    /// Resource download workers; 0 restores the CPU-based default
    #[arg(long)]
    pub threads:       Option<usize>,
}

impl ConfigArg {
    pub fn run(self, layout: &Layout) -> Result<ExitCode> {
        let path = layout.settings_file();
        let mut settings = Settings::try_load(&path)?;
        let before = settings.clone();

        if let Some(proxy) = self.proxy {
            settings.url_proxy = proxy.trim().to_string();
        }
        if let Some(low_data) = self.low_data {
            settings.low_data_mode = low_data;
        }
        if let Some(verify) = self.verify_cached {
            settings.verify_cached_resources = verify;
        }
        if let Some(threads) = self.threads {
            settings.asset_threads = (threads > 0).then_some(threads);
        }

        if settings != before {
            settings
                .save(&path)
                .with_context(|| format!("failed to save {}", path.display()))?;
        }

        println!("# {}", path.display());
        println!("url_proxy = {:?}", settings.url_proxy);
        println!("low_data_mode = {}", settings.low_data_mode);
        println!("verify_cached_resources = {}", settings.verify_cached_resources);
        match settings.asset_threads {
            Some(threads) => println!("asset_threads = {threads}"),
            None => println!("# asset_threads = {} (default)", quarry_install::default_asset_threads()),
        }
        Ok(ExitCode::SUCCESS)
    }
}
