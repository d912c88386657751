use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::splits::SplitLabel;
use crate::types::VocabIndex;

/// Error type for vocabulary lookups, partitioning, and artifact IO.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Lookup of an identifier the vocabulary never observed.
    #[error("unknown {kind} identifier '{id}'")]
    UnknownIdentifier {
        /// Vocabulary label (`item` or `entity`).
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
    /// Reverse lookup of padding or an index past the end.
    #[error("{kind} index {index} is out of range (vocabulary holds {len} identifiers)")]
    IndexOutOfRange {
        /// Vocabulary label (`item` or `entity`).
        kind: &'static str,
        /// Requested index.
        index: VocabIndex,
        /// Number of identifiers in the vocabulary.
        len: usize,
    },
    /// Filtering left nothing in a partition that must not be empty.
    #[error("{0} partition is empty after filtering")]
    EmptyPartition(SplitLabel),
    /// A tabular row could not be parsed.
    #[error("malformed row at {}:{line}: {reason}", .path.display())]
    MalformedRow {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },
    /// Invalid parameters or inconsistent persisted state.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A staged artifact could not be renamed into place.
    #[error("failed to persist artifact: {0}")]
    Persist(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Delimited-text read/write failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// JSON read/write failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
