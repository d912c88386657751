use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use crate::types::{EntityId, ItemId, Timestamp, VocabIndex};

/// One interaction: an entity touched an item at a point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawEvent {
    /// User or session that produced the event.
    pub entity: EntityId,
    /// Item referenced by the event.
    pub item: ItemId,
    /// Event time in epoch seconds.
    pub time: Timestamp,
}

impl RawEvent {
    /// Convenience constructor used by tests and in-memory callers.
    pub fn new(entity: impl Into<EntityId>, item: impl Into<ItemId>, time: Timestamp) -> Self {
        Self {
            entity: entity.into(),
            item: item.into(),
            time,
        }
    }
}

/// Entity index -> chronologically ordered item indices for one partition.
///
/// Serialized as a JSON object keyed by the entity index rendered as a string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedSequences {
    sequences: BTreeMap<VocabIndex, Vec<VocabIndex>>,
}

impl EncodedSequences {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the sequence for `entity`.
    pub fn insert(&mut self, entity: VocabIndex, items: Vec<VocabIndex>) {
        self.sequences.insert(entity, items);
    }

    /// Sequence recorded for `entity`, if any.
    pub fn get(&self, entity: VocabIndex) -> Option<&[VocabIndex]> {
        self.sequences.get(&entity).map(Vec::as_slice)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// True when no entity has a sequence.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Total number of encoded events across all entities.
    pub fn event_count(&self) -> usize {
        self.sequences.values().map(Vec::len).sum()
    }

    /// Iterate `(entity, items)` in ascending entity-index order.
    pub fn iter(&self) -> impl Iterator<Item = (VocabIndex, &[VocabIndex])> {
        self.sequences
            .iter()
            .map(|(entity, items)| (*entity, items.as_slice()))
    }
}

impl FromIterator<(VocabIndex, Vec<VocabIndex>)> for EncodedSequences {
    fn from_iter<T: IntoIterator<Item = (VocabIndex, Vec<VocabIndex>)>>(iter: T) -> Self {
        Self {
            sequences: iter.into_iter().collect(),
        }
    }
}

/// Fixed-width evaluation batch for next-item prediction.
///
/// Row `r` of `inputs` and `targets` belongs to `entities[r]`. Both arrays
/// have shape `[entities.len(), max_len]` and use `0` as padding.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalBatch {
    /// Entity indices, one per row.
    pub entities: Vec<VocabIndex>,
    /// Leading `min(max_len, len)` items of each sequence, zero padded.
    pub inputs: Array2<VocabIndex>,
    /// `inputs` shifted left by one position, zero padded.
    pub targets: Array2<VocabIndex>,
}

impl EvalBatch {
    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True for a batch without rows.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
