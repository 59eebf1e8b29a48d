//! Shared setup for the rankdata binaries: configuration and logging.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rankdata_core::{ExportConfig, TARGET_COLUMN};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "RANKDATA_CONFIG";

const DEFAULT_LOG_FILTER: &str = "warn,rankdata_cli=info,rankdata_core=info";

/// Column layout of the three sources plus output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub property_columns: Vec<String>,
    pub feature_columns: Vec<String>,
    pub target_column: String,
    /// Where the structured snapshot is written.
    pub snapshot_path: PathBuf,
    pub export: ExportConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            property_columns: vec!["sequence".to_string()],
            feature_columns: [
                "sentence_length",
                "article_length",
                "sentence_order",
                "predicate_tense",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            target_column: TARGET_COLUMN.to_string(),
            snapshot_path: PathBuf::from("data/instances.json"),
            export: ExportConfig::default(),
        }
    }
}

impl CliConfig {
    /// Defaults, overridden by the file named in `RANKDATA_CONFIG` if set.
    pub fn load() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: PathBuf) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid config `{}`", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// Log to stderr; stdout is reserved for data.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
