use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::TranscodeOptions;
use crate::batch;

#[derive(Parser, Debug)]
pub struct DirCommand {
    /// Directory containing the recordings
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the transcodes are written to, under the same file names
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub options: TranscodeOptions,
}

impl DirCommand {
    pub async fn run(self) -> Result<()> {
        let transcoder = self.options.transcoder()?;

        let jobs = batch::plan_jobs(&self.input, &self.output)?;
        if jobs.is_empty() {
            eprintln!(
                "No {} files found in {}",
                batch::discovery::VALID_EXTENSIONS.join("/"),
                self.input.display()
            );
            return Ok(());
        }

        batch::run_jobs(&transcoder, &jobs).await?;
        Ok(())
    }
}
