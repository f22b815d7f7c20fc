//! CLI for the SDM segmented downloader.

mod commands;
mod format;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sdm_core::config::{self, SdmConfig};
use std::path::{Path, PathBuf};

use commands::run_download;

/// Top-level CLI for SDM.
#[derive(Debug, Parser)]
#[command(name = "sdm")]
#[command(about = "SDM: download one file over HTTP(S) in concurrent byte ranges", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL to a local file.
    Download {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination file, or a directory to place the derived filename in.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Number of concurrent workers (0 picks one from the file size).
        #[arg(short, long, default_value = "0", value_name = "N")]
        worker: usize,

        /// Read configuration from this file instead of ~/.config/sdm/config.toml.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Download {
                url,
                output,
                worker,
                config,
            } => {
                let cfg = load_config(config.as_deref())?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_download(&cfg, &url, output.as_deref(), worker).await?;
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<SdmConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

#[cfg(test)]
mod tests;
