//! Dense, stable integer indices for raw item and entity identifiers.
//!
//! Indices start at [`FIRST_INDEX`] so that [`PAD_INDEX`] never names a real
//! identifier.

use indexmap::{IndexMap, IndexSet};

use crate::constants::vocab::{FIRST_INDEX, PAD_INDEX};
use crate::errors::PrepError;
use crate::types::VocabIndex;

/// Error label used for item vocabularies.
pub const ITEM_KIND: &str = "item";
/// Error label used for entity (user/session) vocabularies.
pub const ENTITY_KIND: &str = "entity";

/// Traversal order used when `finalize` hands out indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VocabularyOrder {
    /// Order of first observation.
    #[default]
    FirstSeen,
    /// Descending occurrence count; ties keep first-observation order.
    Frequency,
}

/// Counts identifiers, then assigns indices once.
///
/// Calling [`finalize`](Self::finalize) again never moves an identifier that
/// already has an index; identifiers observed after a previous finalize are
/// appended.
#[derive(Clone, Debug)]
pub struct VocabularyBuilder {
    kind: &'static str,
    counts: IndexMap<String, u64>,
    assigned: IndexSet<String>,
}

impl VocabularyBuilder {
    /// Empty builder whose lookup errors are labelled with `kind`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            counts: IndexMap::new(),
            assigned: IndexSet::new(),
        }
    }

    /// Builder for item identifiers.
    pub fn items() -> Self {
        Self::new(ITEM_KIND)
    }

    /// Builder for user/session identifiers.
    pub fn entities() -> Self {
        Self::new(ENTITY_KIND)
    }

    /// Record one occurrence of `id`.
    pub fn observe(&mut self, id: &str) {
        if let Some(count) = self.counts.get_mut(id) {
            *count += 1;
        } else {
            self.counts.insert(id.to_string(), 1);
        }
    }

    /// Record one occurrence of every identifier yielded by `ids`.
    pub fn observe_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.observe(id.as_ref());
        }
    }

    /// Occurrences recorded for `id` so far.
    pub fn count(&self, id: &str) -> u64 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Number of distinct identifiers observed.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Assign indices to every observed identifier that has none yet.
    pub fn finalize(&mut self, order: VocabularyOrder) -> Vocabulary {
        match order {
            VocabularyOrder::FirstSeen => {
                for id in self.counts.keys() {
                    if !self.assigned.contains(id) {
                        self.assigned.insert(id.clone());
                    }
                }
            }
            VocabularyOrder::Frequency => {
                let mut ranked: Vec<(usize, &String, u64)> = self
                    .counts
                    .iter()
                    .enumerate()
                    .map(|(pos, (id, count))| (pos, id, *count))
                    .collect();
                ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
                for (_, id, _) in ranked {
                    if !self.assigned.contains(id) {
                        self.assigned.insert(id.clone());
                    }
                }
            }
        }
        Vocabulary {
            kind: self.kind,
            ids: self.assigned.clone(),
        }
    }
}

/// Immutable bijection between identifiers and indices `1..=len`.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    kind: &'static str,
    ids: IndexSet<String>,
}

// `IndexSet` equality ignores order; two vocabularies are equal only when
// every identifier has the same index.
impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.ids.iter().eq(other.ids.iter())
    }
}

impl Eq for Vocabulary {}

impl Vocabulary {
    /// Rebuild a vocabulary from identifiers listed in index order.
    ///
    /// The first identifier receives [`FIRST_INDEX`]. Duplicates are rejected.
    pub fn from_ordered<I>(kind: &'static str, ids: I) -> Result<Self, PrepError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut set = IndexSet::new();
        for id in ids {
            if !set.insert(id.clone()) {
                return Err(PrepError::Configuration(format!(
                    "duplicate {kind} identifier '{id}' in persisted vocabulary"
                )));
            }
        }
        Ok(Self { kind, ids: set })
    }

    /// Label used in lookup errors.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of identifiers (padding excluded).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when no identifier has been assigned.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` has an index.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Index assigned to `id`.
    pub fn index_of(&self, id: &str) -> Result<VocabIndex, PrepError> {
        self.ids
            .get_index_of(id)
            .map(|pos| pos as VocabIndex + FIRST_INDEX)
            .ok_or_else(|| PrepError::UnknownIdentifier {
                kind: self.kind,
                id: id.to_string(),
            })
    }

    /// Identifier stored at `index`.
    pub fn id_of(&self, index: VocabIndex) -> Result<&str, PrepError> {
        let out_of_range = || PrepError::IndexOutOfRange {
            kind: self.kind,
            index,
            len: self.ids.len(),
        };
        if index == PAD_INDEX {
            return Err(out_of_range());
        }
        self.ids
            .get_index((index - FIRST_INDEX) as usize)
            .map(String::as_str)
            .ok_or_else(out_of_range)
    }

    /// Identifiers in index order, starting at [`FIRST_INDEX`].
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(ids: &[&str]) -> Vocabulary {
        let mut builder = VocabularyBuilder::items();
        builder.observe_all(ids);
        builder.finalize(VocabularyOrder::FirstSeen)
    }

    #[test]
    fn indices_follow_first_observation_and_start_at_one() {
        let vocab = build(&["b", "a", "b", "c", "a"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("b").unwrap(), 1);
        assert_eq!(vocab.index_of("a").unwrap(), 2);
        assert_eq!(vocab.index_of("c").unwrap(), 3);
        assert_eq!(vocab.ids().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn finalize_twice_keeps_existing_indices() {
        let mut builder = VocabularyBuilder::items();
        builder.observe_all(["x", "y"]);
        let first = builder.finalize(VocabularyOrder::FirstSeen);
        builder.observe("z");
        builder.observe("x");
        let second = builder.finalize(VocabularyOrder::Frequency);
        assert_eq!(first.index_of("x").unwrap(), second.index_of("x").unwrap());
        assert_eq!(first.index_of("y").unwrap(), second.index_of("y").unwrap());
        assert_eq!(second.index_of("z").unwrap(), 3);
        assert_eq!(builder.count("x"), 2);
    }

    #[test]
    fn frequency_order_breaks_ties_by_first_seen() {
        let mut builder = VocabularyBuilder::items();
        builder.observe_all(["low", "tie_a", "high", "tie_b", "high", "tie_a", "tie_b", "high"]);
        let vocab = builder.finalize(VocabularyOrder::Frequency);
        assert_eq!(
            vocab.ids().collect::<Vec<_>>(),
            vec!["high", "tie_a", "tie_b", "low"]
        );
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let vocab = build(&["a"]);
        match vocab.index_of("missing") {
            Err(PrepError::UnknownIdentifier { kind, id }) => {
                assert_eq!(kind, ITEM_KIND);
                assert_eq!(id, "missing");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn padding_and_overflow_indices_are_out_of_range() {
        let vocab = build(&["a", "b"]);
        assert!(matches!(
            vocab.id_of(PAD_INDEX),
            Err(PrepError::IndexOutOfRange { index: 0, len: 2, .. })
        ));
        assert!(matches!(
            vocab.id_of(3),
            Err(PrepError::IndexOutOfRange { index: 3, .. })
        ));
        assert_eq!(vocab.id_of(2).unwrap(), "b");
    }

    #[test]
    fn from_ordered_restores_indices_and_rejects_duplicates() {
        let original = build(&["q", "r", "s"]);
        let restored = Vocabulary::from_ordered(
            ITEM_KIND,
            original.ids().map(str::to_string).collect::<Vec<_>>(),
        )
        .unwrap();
        assert_eq!(original, restored);

        let dup = Vocabulary::from_ordered(ENTITY_KIND, vec!["a".to_string(), "a".to_string()]);
        assert!(matches!(dup, Err(PrepError::Configuration(_))));
    }
}
