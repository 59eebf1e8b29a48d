//! rankdata CLI
//!
//! Merges a properties source, a features source and a target source (all
//! tab-separated, first column `id`) into one instance collection, prints the
//! line dump to stdout and writes a structured snapshot.
//!
//! Column names and the snapshot path come from `RANKDATA_CONFIG` (a JSON
//! file) when set; otherwise the built-in defaults apply.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rankdata_cli::{init_tracing, CliConfig};
use rankdata_core::{InstanceCollection, SourceKind};

#[derive(Parser)]
#[command(name = "rankdata")]
#[command(author, version, about = "Merge TSV sources into a labeled instance collection")]
struct Cli {
    /// TSV with instance properties
    properties: PathBuf,
    /// TSV with instance features
    features: PathBuf,
    /// TSV with the target column
    target: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = CliConfig::load()?;

    let mut instances = InstanceCollection::new().with_config(config.export.clone());
    instances
        .load_delimited(&cli.properties, SourceKind::Properties, &config.property_columns)
        .with_context(|| format!("loading properties from `{}`", cli.properties.display()))?;
    instances
        .load_delimited(&cli.features, SourceKind::Features, &config.feature_columns)
        .with_context(|| format!("loading features from `{}`", cli.features.display()))?;
    instances
        .load_delimited(&cli.target, SourceKind::Target, &[config.target_column.as_str()])
        .with_context(|| format!("loading target from `{}`", cli.target.display()))?;
    tracing::info!(instances = instances.len(), "merged sources");

    let mut stdout = io::stdout().lock();
    stdout.write_all(instances.to_lines().as_bytes())?;
    stdout.flush()?;

    if let Some(parent) = config.snapshot_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating `{}`", parent.display()))?;
        }
    }
    instances.write_structured(&config.snapshot_path)?;
    Ok(())
}
