use crate::data::RawEvent;
use crate::filter::{entity_lengths, item_supports};

/// Size summary of one event table, reported in logs.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionStats {
    /// Event count.
    pub events: usize,
    /// Distinct entities.
    pub entities: usize,
    /// Distinct items.
    pub items: usize,
    /// Shortest entity sequence.
    pub min_length: usize,
    /// Longest entity sequence.
    pub max_length: usize,
    /// Mean events per entity.
    pub mean_length: f64,
}

/// Summarize `events`. Returns `None` for an empty table.
pub fn partition_stats(events: &[RawEvent]) -> Option<PartitionStats> {
    let lengths = entity_lengths(events);
    let min_length = *lengths.values().min()?;
    let max_length = *lengths.values().max()?;
    Some(PartitionStats {
        events: events.len(),
        entities: lengths.len(),
        items: item_supports(events).len(),
        min_length,
        max_length,
        mean_length: events.len() as f64 / lengths.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_stats_reports_lengths() {
        let events = vec![
            RawEvent::new("a", "x", 1),
            RawEvent::new("a", "y", 2),
            RawEvent::new("a", "x", 3),
            RawEvent::new("b", "z", 4),
        ];
        let stats = partition_stats(&events).expect("stats");
        assert_eq!(stats.events, 4);
        assert_eq!(stats.entities, 2);
        assert_eq!(stats.items, 3);
        assert_eq!(stats.min_length, 1);
        assert_eq!(stats.max_length, 3);
        assert!((stats.mean_length - 2.0).abs() < 1e-6);
    }

    #[test]
    fn partition_stats_empty_is_none() {
        assert!(partition_stats(&[]).is_none());
    }
}
