use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coin_consolidator", version)]
#[command(
    about = "Consolidate coin counter files into a monthly CSV, archive them, then mirror launcher folders"
)]
pub struct Args {
    /// Directory holding the counter (*.txt) files
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// JSON config file (defaults to <DIR>/coin_consolidator.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Skip archiving; counter files stay where they are
    #[arg(long)]
    pub no_archive: bool,

    /// Skip the external mirroring step
    #[arg(long)]
    pub no_mirror: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes priority.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parse and validate command line arguments
    pub fn parse_and_validate() -> Result<Self> {
        Args::parse().validate()
    }

    pub fn validate(self) -> Result<Self> {
        if !self.dir.exists() {
            bail!("Directory does not exist: {}", self.dir.display());
        }
        if !self.dir.is_dir() {
            bail!("Path is not a directory: {}", self.dir.display());
        }
        if let Some(config) = &self.config {
            if !config.is_file() {
                bail!("Config file does not exist: {}", config.display());
            }
        }

        Ok(self)
    }
}
