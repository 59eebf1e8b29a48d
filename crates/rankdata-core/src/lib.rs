//! Labeled instance collections for learning-to-rank
//!
//! An [`Instance`] is one record: an id, string properties, numeric features,
//! an optional target (the label) and an optional score (assigned by a model).
//! An [`InstanceCollection`] owns instances by id and:
//!
//! - merge-loads properties, features and targets from separate tab-separated
//!   sources that share an id column
//! - loads and writes structured JSON snapshots
//! - exports a line dump, a TREC-style ranking-evaluation run, and a sparse
//!   LibSVM/RankLib ranking-training file
//!
//! ```text
//!   properties.tsv ─┐
//!   features*.tsv  ─┼─► InstanceCollection ─┬─► snapshot.json
//!   target.tsv     ─┘        ▲              ├─► lines
//!   snapshot.json ───────────┘              ├─► run (trec_eval)
//!                                           └─► train (ranklib)
//! ```
//!
//! Everything is synchronous and in memory. File writers are not atomic: a
//! failure part-way through a batched write can leave a truncated file.

pub mod collection;
pub mod config;
pub mod error;
pub mod formats;
pub mod instance;

pub use collection::{InstanceCollection, SourceKind, TARGET_COLUMN};
pub use config::{ExportConfig, DEFAULT_QID_PROPERTY};
pub use error::{InstanceError, Result};
pub use formats::structured::StructuredInstances;
pub use formats::RankedEntry;
pub use instance::{Instance, InstanceRecord};
