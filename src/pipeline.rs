//! End-to-end dataset preparation.
//!
//! Two stages, each writing its artifacts all-or-nothing:
//! 1. [`preprocess_dataset`]: raw log -> filtered train/validation/test tables.
//! 2. [`load_or_prepare`]: tables -> vocabularies + encoded sequences, cached
//!    on disk and reloaded on later runs.

use std::fs;
use std::io;

use tracing::{info, warn};

use crate::batch::prepare_eval_batches;
use crate::config::{PrepConfig, SplitConfig};
use crate::data::{EncodedSequences, EvalBatch};
use crate::encode::{Vocabularies, build_vocabularies, encode_partition};
use crate::errors::PrepError;
use crate::metrics::partition_stats;
use crate::source::{EventSource, TsvEventSource};
use crate::splits::{Partitions, SplitLabel, split_chronologically};
use crate::transport::fs::{
    DatasetLayout, StagedArtifacts, read_json, read_partition, read_vocabulary,
};
use crate::vocab::{ENTITY_KIND, ITEM_KIND, VocabularyOrder};

/// Encoded partitions plus the vocabularies that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedDataset {
    /// Encoded training sequences.
    pub train: EncodedSequences,
    /// Encoded validation sequences.
    pub validation: EncodedSequences,
    /// Encoded test sequences.
    pub test: EncodedSequences,
    /// Vocabularies used for encoding.
    pub vocabularies: Vocabularies,
}

impl PreparedDataset {
    /// Number of distinct items (padding excluded).
    pub fn n_items(&self) -> usize {
        self.vocabularies.items.len()
    }

    /// Number of distinct users/sessions.
    pub fn n_users(&self) -> usize {
        self.vocabularies.entities.len()
    }

    /// Encoded sequences of one partition.
    pub fn partition(&self, label: SplitLabel) -> &EncodedSequences {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// Padded evaluation batches for one partition.
    pub fn eval_batches(
        &self,
        label: SplitLabel,
        batch_size: usize,
        max_len: usize,
    ) -> Result<Vec<EvalBatch>, PrepError> {
        prepare_eval_batches(self.partition(label), batch_size, max_len)
    }
}

/// Split `<data_dir>/<name>/<name>.tsv` and write the three partition tables.
pub fn preprocess_dataset(name: &str, config: &PrepConfig) -> Result<Partitions, PrepError> {
    let layout = DatasetLayout::new(&config.data_dir, name);
    let source = TsvEventSource::new(layout.raw_events());
    split_source(&source, &layout, &config.split)
}

/// Split events from any source and write the partition tables for `layout`.
///
/// Any encoded cache of the previous tables is invalidated first.
pub fn split_source(
    source: &dyn EventSource,
    layout: &DatasetLayout,
    config: &SplitConfig,
) -> Result<Partitions, PrepError> {
    let events = source.load()?;
    info!(source = source.id(), events = events.len(), "loaded raw events");
    let partitions = split_chronologically(events, config)?;

    let mut staged = StagedArtifacts::new();
    for label in SplitLabel::ALL {
        let events = partitions.get(label);
        if let Some(stats) = partition_stats(events) {
            info!(
                split = %label,
                events = stats.events,
                entities = stats.entities,
                items = stats.items,
                mean_length = stats.mean_length,
                "partition summary"
            );
        }
        staged.stage_partition(layout.partition(label), events)?;
    }
    invalidate_encoded(layout)?;
    staged.commit()?;
    Ok(partitions)
}

/// Remove the encoded-train cache marker so the next [`load_or_prepare`]
/// re-encodes from the current partition tables.
fn invalidate_encoded(layout: &DatasetLayout) -> Result<(), PrepError> {
    let marker = layout.encoded(SplitLabel::Train);
    match fs::remove_file(&marker) {
        Ok(()) => {
            info!(path = %marker.display(), "stale encoded cache removed");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Build vocabularies and encode all three partitions.
pub fn encode_partitions(
    partitions: &Partitions,
    order: VocabularyOrder,
) -> Result<PreparedDataset, PrepError> {
    let vocabularies = build_vocabularies(partitions, order);
    if vocabularies.items.is_empty() {
        return Err(PrepError::EmptyPartition(SplitLabel::Train));
    }
    Ok(PreparedDataset {
        train: encode_partition(&partitions.train, &vocabularies)?,
        validation: encode_partition(&partitions.validation, &vocabularies)?,
        test: encode_partition(&partitions.test, &vocabularies)?,
        vocabularies,
    })
}

/// Persist vocabularies and encoded partitions.
///
/// The encoded train file doubles as the cache marker, so it is renamed last.
pub fn write_prepared(layout: &DatasetLayout, prepared: &PreparedDataset) -> Result<(), PrepError> {
    let mut staged = StagedArtifacts::new();
    staged.stage_vocabulary(layout.item_vocab(), &prepared.vocabularies.items)?;
    staged.stage_vocabulary(layout.entity_vocab(), &prepared.vocabularies.entities)?;
    for label in [SplitLabel::Test, SplitLabel::Validation, SplitLabel::Train] {
        staged.stage_json(layout.encoded(label), prepared.partition(label))?;
    }
    let written = staged.commit()?;
    info!(dataset = layout.name(), artifacts = written.len(), "encoded dataset written");
    Ok(())
}

/// Load the encoded dataset, preparing it from the partition tables first
/// when no encoded train file exists yet.
pub fn load_or_prepare(name: &str, config: &PrepConfig) -> Result<PreparedDataset, PrepError> {
    let layout = DatasetLayout::new(&config.data_dir, name);
    if !layout.encoded(SplitLabel::Train).exists() {
        info!(dataset = name, "no encoded cache found, preparing from partition tables");
        let partitions = Partitions {
            train: read_partition(&layout.partition(SplitLabel::Train))?,
            validation: read_partition(&layout.partition(SplitLabel::Validation))?,
            test: read_partition(&layout.partition(SplitLabel::Test))?,
        };
        let prepared = encode_partitions(&partitions, config.vocab_order)?;
        write_prepared(&layout, &prepared)?;
    }
    load_prepared(&layout)
}

/// Read a previously written encoded dataset.
pub fn load_prepared(layout: &DatasetLayout) -> Result<PreparedDataset, PrepError> {
    let prepared = PreparedDataset {
        train: read_json(&layout.encoded(SplitLabel::Train))?,
        validation: read_json(&layout.encoded(SplitLabel::Validation))?,
        test: read_json(&layout.encoded(SplitLabel::Test))?,
        vocabularies: Vocabularies {
            items: read_vocabulary(&layout.item_vocab(), ITEM_KIND)?,
            entities: read_vocabulary(&layout.entity_vocab(), ENTITY_KIND)?,
        },
    };
    for label in [SplitLabel::Validation, SplitLabel::Test] {
        if prepared.partition(label).is_empty() {
            warn!(dataset = layout.name(), split = %label, "encoded partition is empty");
        }
    }
    info!(
        dataset = layout.name(),
        n_items = prepared.n_items(),
        n_users = prepared.n_users(),
        train = prepared.train.len(),
        validation = prepared.validation.len(),
        test = prepared.test.len(),
        "encoded dataset loaded"
    );
    Ok(prepared)
}
