//! Sparse-entity and sparse-item filtering.
//!
//! Removing rare items can push entities back under the length threshold
//! and vice versa, so the two constraints are applied alternately until a
//! pass removes nothing.

use std::collections::HashMap;

use tracing::debug;

use crate::data::RawEvent;

/// Thresholds applied by [`filter_sparse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterThresholds {
    /// Entities must have strictly more events than this.
    pub min_entity_events: usize,
    /// Items must be referenced by at least this many events.
    pub min_item_support: usize,
}

/// Result of [`filter_sparse`].
#[derive(Clone, Debug)]
pub struct FilterOutcome {
    /// Surviving events, in their original relative order.
    pub events: Vec<RawEvent>,
    /// Number of entity+item passes run before nothing changed.
    pub passes: usize,
}

/// Events per entity.
pub fn entity_lengths(events: &[RawEvent]) -> HashMap<&str, usize> {
    let mut lengths: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *lengths.entry(event.entity.as_str()).or_insert(0) += 1;
    }
    lengths
}

/// Events per item.
pub fn item_supports(events: &[RawEvent]) -> HashMap<&str, usize> {
    let mut supports: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *supports.entry(event.item.as_str()).or_insert(0) += 1;
    }
    supports
}

/// Mean events per entity, `0.0` when there are none.
pub fn mean_entity_length(events: &[RawEvent]) -> f64 {
    let lengths = entity_lengths(events);
    if lengths.is_empty() {
        return 0.0;
    }
    events.len() as f64 / lengths.len() as f64
}

/// Keep events whose entity has more than `min_events` events.
pub fn retain_long_entities(mut events: Vec<RawEvent>, min_events: usize) -> Vec<RawEvent> {
    let keep: HashMap<String, bool> = entity_lengths(&events)
        .into_iter()
        .map(|(entity, len)| (entity.to_string(), len > min_events))
        .collect();
    events.retain(|event| keep.get(&event.entity).copied().unwrap_or(false));
    events
}

/// Keep events whose item is referenced at least `min_support` times.
pub fn retain_supported_items(mut events: Vec<RawEvent>, min_support: usize) -> Vec<RawEvent> {
    let keep: HashMap<String, bool> = item_supports(&events)
        .into_iter()
        .map(|(item, support)| (item.to_string(), support >= min_support))
        .collect();
    events.retain(|event| keep.get(&event.item).copied().unwrap_or(false));
    events
}

/// Drop short entities and rare items until both constraints hold.
///
/// The entity-length filter runs once up front; each pass then applies the
/// item-support filter followed by the entity-length filter.
pub fn filter_sparse(events: Vec<RawEvent>, thresholds: FilterThresholds) -> FilterOutcome {
    let mut current = retain_long_entities(events, thresholds.min_entity_events);
    let mut passes = 0;
    loop {
        passes += 1;
        let before = current.len();
        current = retain_supported_items(current, thresholds.min_item_support);
        debug!(
            pass = passes,
            unique_items = item_supports(&current).len(),
            mean_length = mean_entity_length(&current),
            "item support filter applied"
        );
        current = retain_long_entities(current, thresholds.min_entity_events);
        if current.len() == before {
            break;
        }
    }
    FilterOutcome {
        events: current,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(entity: &str, item: &str, time: i64) -> RawEvent {
        RawEvent::new(entity, item, time)
    }

    #[test]
    fn entity_threshold_is_exclusive() {
        let events = vec![
            ev("a", "x", 1),
            ev("a", "y", 2),
            ev("b", "x", 1),
            ev("b", "y", 2),
            ev("b", "z", 3),
        ];
        let kept = retain_long_entities(events, 2);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|event| event.entity == "b"));
    }

    #[test]
    fn item_threshold_is_inclusive() {
        let events = vec![ev("a", "x", 1), ev("b", "x", 2), ev("c", "y", 3)];
        let kept = retain_supported_items(events, 2);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|event| event.item == "x"));
    }

    #[test]
    fn entity_filter_is_reapplied_after_item_filter() {
        // "s2" survives the first entity pass but loses its rare item and
        // falls to two events.
        let mut events = Vec::new();
        for (idx, entity) in ["s1", "s3"].iter().enumerate() {
            for t in 0..3 {
                events.push(ev(entity, "common", idx as i64 * 10 + t));
            }
        }
        events.push(ev("s2", "common", 100));
        events.push(ev("s2", "common", 101));
        events.push(ev("s2", "rare", 102));

        let outcome = filter_sparse(
            events,
            FilterThresholds {
                min_entity_events: 2,
                min_item_support: 2,
            },
        );
        assert!(outcome.events.iter().all(|event| event.entity != "s2"));
        assert_eq!(outcome.events.len(), 6);
    }

    #[test]
    fn cascading_removals_reach_a_fixed_point() {
        // Removing "rare" shortens "b", whose removal drops "mid" below support,
        // which in turn shortens "a".
        let events = vec![
            ev("a", "mid", 1),
            ev("a", "hot", 2),
            ev("a", "hot", 3),
            ev("b", "mid", 1),
            ev("b", "hot", 2),
            ev("b", "rare", 3),
            ev("c", "hot", 1),
            ev("c", "hot", 2),
            ev("c", "hot", 3),
        ];
        let thresholds = FilterThresholds {
            min_entity_events: 2,
            min_item_support: 2,
        };
        let outcome = filter_sparse(events, thresholds);
        assert!(outcome.passes >= 2);
        assert!(outcome.events.iter().all(|event| event.entity == "c"));

        let again = filter_sparse(outcome.events.clone(), thresholds);
        assert_eq!(again.events, outcome.events);
        assert_eq!(again.passes, 1);
    }

    #[test]
    fn mean_entity_length_handles_empty() {
        assert_eq!(mean_entity_length(&[]), 0.0);
        let events = vec![ev("a", "x", 1), ev("a", "y", 2), ev("b", "x", 3)];
        assert!((mean_entity_length(&events) - 1.5).abs() < 1e-9);
    }
}
