use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::archive::DEFAULT_ARCHIVE_DIR_NAME;
use crate::mirror::MirrorJob;

/// Config file picked up from the consolidated directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "coin_consolidator.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive root, relative to the consolidated directory
    pub archive_dir_name: String,
    pub mirror: MirrorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            archive_dir_name: DEFAULT_ARCHIVE_DIR_NAME.to_string(),
            mirror: MirrorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub program: String,
    /// Appended after source and destination
    pub flags: Vec<String>,
    pub success_codes: Vec<i32>,
    pub jobs: Vec<MirrorJob>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        MirrorConfig {
            program: "robocopy".to_string(),
            flags: vec!["/mir".to_string()],
            success_codes: vec![0],
            jobs: vec![
                MirrorJob::new(r"C:\ProgramData\Riot Games", r"D:\Launchers\Valorant"),
                MirrorJob::new(r"C:\ProgramData\Epic", r"D:\Launchers\Epic"),
            ],
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields fall back to the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Compact JSON form, same shape `load` reads
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize config")
    }

    /// Use the explicit config if given, else `<dir>/coin_consolidator.json`
    /// when present, else the built-in defaults
    pub fn resolve(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local = dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            tracing::info!("Using config {}", local.display());
            return Self::load(&local);
        }

        Ok(Config::default())
    }
}
