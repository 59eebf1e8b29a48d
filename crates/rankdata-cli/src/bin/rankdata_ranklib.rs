//! Convert a structured snapshot into a RankLib training file.
//!
//! Instances are grouped by a (typically non-integer) property, each group
//! gets a sequential integer qid, and the training file is written sorted by
//! that qid. The enriched snapshot can optionally be written back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rankdata_cli::{init_tracing, CliConfig};
use rankdata_core::InstanceCollection;

#[derive(Parser)]
#[command(name = "rankdata-ranklib")]
#[command(author, version, about = "Write a RankLib training file from a JSON snapshot")]
struct Args {
    /// Structured snapshot to read
    snapshot: PathBuf,
    /// Property whose distinct values become qids
    group_property: String,
    /// RankLib file to write
    output: PathBuf,
    /// Write the snapshot, with qids added, here
    snapshot_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = CliConfig::load()?;

    let mut instances = InstanceCollection::read_structured(&args.snapshot)
        .with_context(|| format!("reading `{}`", args.snapshot.display()))?
        .with_config(config.export);
    let groups = instances.assign_numeric_ids(&args.group_property);
    tracing::info!(groups, property = %args.group_property, "assigned qids");

    if let Some(out) = &args.snapshot_out {
        instances.write_structured(out)?;
    }

    let qid_property = instances.config().qid_property.clone();
    instances
        .write_ranking_train(&args.output, Some(qid_property.as_str()))
        .with_context(|| format!("writing `{}`", args.output.display()))?;
    Ok(())
}
