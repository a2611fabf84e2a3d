use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ShowConfigCommand {
    /// YAML transcode profile to validate (built-in profile if omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ShowConfigCommand {
    pub async fn run(self) -> Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        print!("{}", config.to_yaml_string()?);
        Ok(())
    }
}
