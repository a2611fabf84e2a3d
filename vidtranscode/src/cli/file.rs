use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::TranscodeOptions;

#[derive(Parser, Debug)]
pub struct FileCommand {
    /// Input video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output video file (overwritten if it exists)
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub options: TranscodeOptions,
}

impl FileCommand {
    pub async fn run(self) -> Result<()> {
        let transcoder = self.options.transcoder()?;
        transcoder
            .transcode(&self.input, &self.output)
            .await
            .with_context(|| format!("failed to transcode {}", self.input.display()))
    }
}
