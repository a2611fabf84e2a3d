use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::{signal, sync::watch};

use crate::config::Config;
use crate::ffmpeg::{DEFAULT_PROGRAM, DEFAULT_REPORT_INTERVAL, Transcoder};

mod dir;
mod file;
mod show_config;

pub use dir::DirCommand;
pub use file::FileCommand;
pub use show_config::ShowConfigCommand;

#[derive(Parser, Debug)]
#[command(name = "vidtranscode")]
#[command(about = "Transcode recordings with ffmpeg, mixing the mic track into the main audio")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transcode a single file
    File(FileCommand),
    /// Transcode every .mp4 and .mkv file in a directory
    Dir(DirCommand),
    /// Print the effective transcode profile as YAML
    ShowConfig(ShowConfigCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::File(cmd) => cmd.run().await,
            Command::Dir(cmd) => cmd.run().await,
            Command::ShowConfig(cmd) => cmd.run().await,
        }
    }
}

/// Options shared by the commands that run ffmpeg.
#[derive(clap::Args, Debug)]
pub struct TranscodeOptions {
    /// YAML transcode profile (built-in profile if omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, default_value = DEFAULT_PROGRAM)]
    pub ffmpeg: PathBuf,

    /// Seconds between progress reports (1 to 3600)
    #[arg(
        long,
        default_value_t = DEFAULT_REPORT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub report_interval: u64,
}

impl TranscodeOptions {
    /**
        Build a transcoder from the selected profile.

        Ctrl+C stops the running job instead of leaving ffmpeg behind.
    */
    pub fn transcoder(&self) -> Result<Transcoder> {
        let config = load_config(self.config.as_deref())?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, stopping ffmpeg...");
                let _ = shutdown_tx.send(true);
            }
        });

        Ok(Transcoder::new(config)?
            .with_program(&self.ffmpeg)
            .with_report_interval(Duration::from_secs(self.report_interval))
            .with_shutdown(shutdown_rx))
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}
