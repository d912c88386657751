#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Evaluation batching with fixed-width padded rows.
pub mod batch;
/// Command-line entry point shared by the binary.
pub mod cli;
/// Split and run configuration types.
pub mod config;
/// Centralized constants used across filtering, splitting, and layout.
pub mod constants;
/// Event, encoded-sequence, and batch types.
pub mod data;
/// Chronological grouping and vocabulary encoding.
pub mod encode;
/// Sparse entity/item filtering.
pub mod filter;
/// Partition summaries for logging.
pub mod metrics;
/// Dataset preparation stages and on-disk caching.
pub mod pipeline;
mod rng;
/// Event source traits and built-in sources.
pub mod source;
/// Chronological train/validation/test partitioning.
pub mod splits;
/// Input/output transports (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Identifier vocabularies.
pub mod vocab;

mod errors;

pub use batch::{EvalBatcher, prepare_eval_batches};
pub use config::{PrepConfig, SplitConfig, SplitVariant};
pub use data::{EncodedSequences, EvalBatch, RawEvent};
pub use encode::{Vocabularies, build_vocabularies, decode_sequence, encode_partition};
pub use errors::PrepError;
pub use filter::{FilterThresholds, filter_sparse};
pub use pipeline::{PreparedDataset, load_or_prepare, preprocess_dataset};
pub use source::{EventSource, InMemoryEventSource, TsvEventSource};
pub use splits::{Partitions, PivotRule, SplitLabel, split_chronologically};
pub use transport::fs::DatasetLayout;
pub use types::{DatasetName, EntityId, ItemId, Timestamp, VocabIndex};
pub use vocab::{Vocabulary, VocabularyBuilder, VocabularyOrder};
