use std::path::PathBuf;

use rankdata_ingest_tsv::TsvError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstanceError>;

#[derive(Debug, Error)]
pub enum InstanceError {
    /// Unreadable source or header mismatch.
    #[error(transparent)]
    Source(#[from] TsvError),

    #[error(
        "invalid number `{value}` in column `{column}` for instance `{id}` in `{}`",
        path.display()
    )]
    InvalidNumber {
        path: PathBuf,
        id: String,
        column: String,
        value: String,
    },

    #[error("instance `{id}`: sort key `{key}` is not an integer (`{value}`)")]
    NonIntegerSortKey {
        id: String,
        key: String,
        value: String,
    },

    #[error("instance `{id}` has no `{property}` property to use as qid")]
    MissingSortKey { id: String, property: String },

    #[error("instance `{id}` has no target")]
    MissingTarget { id: String },

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl InstanceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
