//! Chronological grouping and vocabulary encoding of partition events.

use indexmap::IndexMap;

use crate::data::{EncodedSequences, RawEvent};
use crate::errors::PrepError;
use crate::splits::Partitions;
use crate::types::VocabIndex;
use crate::vocab::{Vocabulary, VocabularyBuilder, VocabularyOrder};

/// Item and entity vocabularies for one prepared dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabularies {
    /// Items seen in training.
    pub items: Vocabulary,
    /// Users/sessions of every partition.
    pub entities: Vocabulary,
}

/// Group events by entity, each sequence sorted by time.
///
/// Ties keep row order. Entities appear in order of their first row.
pub fn group_sequences(events: &[RawEvent]) -> IndexMap<&str, Vec<&str>> {
    let mut grouped: IndexMap<&str, Vec<&RawEvent>> = IndexMap::new();
    for event in events {
        grouped.entry(event.entity.as_str()).or_default().push(event);
    }
    grouped
        .into_iter()
        .map(|(entity, mut rows)| {
            rows.sort_by_key(|event| event.time);
            (entity, rows.into_iter().map(|event| event.item.as_str()).collect())
        })
        .collect()
}

/// Build both vocabularies from partitioned events.
///
/// Items come from training rows only. Entities are observed train first,
/// then validation, then test, so eval-only sessions still receive an index
/// while training users keep the indices a train-only vocabulary would give.
pub fn build_vocabularies(partitions: &Partitions, order: VocabularyOrder) -> Vocabularies {
    let mut items = VocabularyBuilder::items();
    items.observe_all(partitions.train.iter().map(|event| event.item.as_str()));

    let mut entities = VocabularyBuilder::entities();
    entities.observe_all(partitions.train.iter().map(|event| event.entity.as_str()));
    // Finalize train entities first so eval entities can only append.
    entities.finalize(order);
    entities.observe_all(
        partitions
            .validation
            .iter()
            .chain(&partitions.test)
            .map(|event| event.entity.as_str()),
    );

    Vocabularies {
        items: items.finalize(order),
        entities: entities.finalize(order),
    }
}

/// Map every entity and item of `grouped` to its vocabulary index.
pub fn encode_sequences(
    grouped: &IndexMap<&str, Vec<&str>>,
    vocabularies: &Vocabularies,
) -> Result<EncodedSequences, PrepError> {
    let mut encoded = EncodedSequences::new();
    for (entity, items) in grouped {
        let entity_idx = vocabularies.entities.index_of(entity)?;
        let item_indices = items
            .iter()
            .map(|item| vocabularies.items.index_of(item))
            .collect::<Result<Vec<_>, _>>()?;
        encoded.insert(entity_idx, item_indices);
    }
    Ok(encoded)
}

/// Group then encode one partition.
pub fn encode_partition(
    events: &[RawEvent],
    vocabularies: &Vocabularies,
) -> Result<EncodedSequences, PrepError> {
    encode_sequences(&group_sequences(events), vocabularies)
}

/// Map indices back to their raw identifiers.
pub fn decode_sequence(
    vocabulary: &Vocabulary,
    indices: &[VocabIndex],
) -> Result<Vec<String>, PrepError> {
    indices
        .iter()
        .map(|index| vocabulary.id_of(*index).map(str::to_string))
        .collect()
}
