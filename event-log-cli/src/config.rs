//! Configuration loading and parsing

use anyhow::{Context, Result};
use event_log_miner::{MinerConfig, SchemaMapping};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub mining: MinerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// CSV event log
    pub path: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Explicit column names; positional when absent and `positional` is set
    pub columns: Option<ColumnsConfig>,
    #[serde(default)]
    pub positional: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
            columns: None,
            positional: false,
        }
    }
}

fn default_delimiter() -> char {
    ','
}

impl InputConfig {
    /// Column mapping used to turn CSV rows into events
    pub fn schema_mapping(&self) -> SchemaMapping {
        match &self.columns {
            Some(c) => SchemaMapping::named(&c.case_id, &c.activity, &c.timestamp),
            None if self.positional => SchemaMapping::Positional,
            None => SchemaMapping::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnsConfig {
    pub case_id: String,
    pub activity: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (default: stdout)
    pub path: Option<PathBuf>,
    /// Emit variant and edge rows with the historical column names
    #[serde(default)]
    pub legacy_columns: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Txt,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
