use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::DateTime;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SplitConfig;
use crate::data::RawEvent;
use crate::errors::PrepError;
use crate::filter::{filter_sparse, item_supports, mean_entity_length, retain_long_entities};
use crate::rng::DeterministicRng;
use crate::types::Timestamp;

/// Logical dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Validation split.
    Validation,
    /// Test split.
    Test,
}

impl SplitLabel {
    /// Canonical iteration order.
    pub const ALL: [SplitLabel; 3] = [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];

    /// Lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "validation",
            SplitLabel::Test => "test",
        }
    }
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule separating training events from evaluation candidates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PivotRule {
    /// Pivot is `max(time) - window_secs`. An entity trains iff its last event
    /// falls strictly before the pivot; entities are never divided.
    EntityLastEvent {
        /// Width of the held-out window in seconds.
        window_secs: i64,
    },
    /// Pivot is `min + train_fraction * (max - min)`. Each event trains iff
    /// its own time falls strictly before the pivot.
    GlobalFraction {
        /// Share of the time span assigned to training, in `(0, 1]`.
        train_fraction: f64,
    },
}

/// Raw events of the three partitions, each in original row order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partitions {
    /// Training events.
    pub train: Vec<RawEvent>,
    /// Validation events.
    pub validation: Vec<RawEvent>,
    /// Test events.
    pub test: Vec<RawEvent>,
}

impl Partitions {
    /// Events of one partition.
    pub fn get(&self, label: SplitLabel) -> &[RawEvent] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }
}

/// Earliest and latest event time.
pub fn time_bounds(events: &[RawEvent]) -> Option<(Timestamp, Timestamp)> {
    let min = events.iter().map(|event| event.time).min()?;
    let max = events.iter().map(|event| event.time).max()?;
    Some((min, max))
}

/// `max(time) - window_secs`.
pub fn last_window_pivot(events: &[RawEvent], window_secs: i64) -> Option<Timestamp> {
    time_bounds(events).map(|(_, max)| max.saturating_sub(window_secs))
}

/// `min + fraction * (max - min)`.
pub fn fractional_pivot(events: &[RawEvent], train_fraction: f64) -> Option<f64> {
    time_bounds(events).map(|(min, max)| (max - min) as f64 * train_fraction + min as f64)
}

/// Whole entities whose last event precedes `pivot` train; the rest are eval candidates.
pub fn partition_by_entity_last_event(
    events: Vec<RawEvent>,
    pivot: Timestamp,
) -> (Vec<RawEvent>, Vec<RawEvent>) {
    let mut last_seen: HashMap<&str, Timestamp> = HashMap::new();
    for event in &events {
        last_seen
            .entry(event.entity.as_str())
            .and_modify(|time| *time = (*time).max(event.time))
            .or_insert(event.time);
    }
    let train_entities: HashSet<String> = last_seen
        .into_iter()
        .filter(|(_, last)| *last < pivot)
        .map(|(entity, _)| entity.to_string())
        .collect();
    events
        .into_iter()
        .partition(|event| train_entities.contains(&event.entity))
}

/// Events strictly before `pivot` train; the rest are eval candidates.
pub fn partition_by_event_time(
    events: Vec<RawEvent>,
    pivot: f64,
) -> (Vec<RawEvent>, Vec<RawEvent>) {
    events
        .into_iter()
        .partition(|event| (event.time as f64) < pivot)
}

/// Drop eval events whose item (and optionally entity) never occurs in `train`.
pub fn drop_cold(
    mut eval: Vec<RawEvent>,
    train: &[RawEvent],
    require_train_entity: bool,
) -> Vec<RawEvent> {
    let items: HashSet<&str> = train.iter().map(|event| event.item.as_str()).collect();
    let entities: HashSet<&str> = train.iter().map(|event| event.entity.as_str()).collect();
    eval.retain(|event| {
        items.contains(event.item.as_str())
            && (!require_train_entity || entities.contains(event.entity.as_str()))
    });
    eval
}

/// Distinct entities in order of first appearance.
pub fn unique_entities(events: &[RawEvent]) -> Vec<&str> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|event| event.entity.as_str())
        .filter(|entity| seen.insert(*entity))
        .collect()
}

/// Assign `floor(n / 2)` eval entities to test and the rest to validation.
///
/// Entities are drawn uniformly without replacement using `seed`.
/// Returns `(validation, test)`.
pub fn split_validation_test(eval: Vec<RawEvent>, seed: u64) -> (Vec<RawEvent>, Vec<RawEvent>) {
    let mut entities: Vec<String> = unique_entities(&eval)
        .into_iter()
        .map(str::to_string)
        .collect();
    let test_count = entities.len() / 2;
    entities.shuffle(&mut DeterministicRng::new(seed));
    entities.truncate(test_count);
    let test_entities: HashSet<String> = entities.into_iter().collect();
    let (test, validation) = eval
        .into_iter()
        .partition(|event| test_entities.contains(&event.entity));
    (validation, test)
}

/// Filter sparse data and split it chronologically into train/validation/test.
///
/// Fails with [`PrepError::EmptyPartition`] when nothing is left to train on.
/// Empty validation/test partitions are reported but allowed.
pub fn split_chronologically(
    events: Vec<RawEvent>,
    config: &SplitConfig,
) -> Result<Partitions, PrepError> {
    config.validate()?;
    let total = events.len();
    info!(
        unique_items = item_supports(&events).len(),
        mean_length = mean_entity_length(&events),
        "raw events before filtering"
    );
    let filtered = filter_sparse(events, config.filter);
    info!(
        input_events = total,
        kept_events = filtered.events.len(),
        unique_items = item_supports(&filtered.events).len(),
        mean_length = mean_entity_length(&filtered.events),
        passes = filtered.passes,
        "sparse filter converged"
    );

    let (mut train, eval) = match config.pivot {
        PivotRule::EntityLastEvent { window_secs } => {
            let Some(pivot) = last_window_pivot(&filtered.events, window_secs) else {
                return Err(PrepError::EmptyPartition(SplitLabel::Train));
            };
            info!(pivot, pivot_at = %format_epoch(pivot), "per-entity pivot");
            partition_by_entity_last_event(filtered.events, pivot)
        }
        PivotRule::GlobalFraction { train_fraction } => {
            let Some(pivot) = fractional_pivot(&filtered.events, train_fraction) else {
                return Err(PrepError::EmptyPartition(SplitLabel::Train));
            };
            info!(pivot, pivot_at = %format_epoch(pivot.floor() as Timestamp), "global pivot");
            partition_by_event_time(filtered.events, pivot)
        }
    };

    if let Some(min_events) = config.min_train_entity_events {
        debug!(
            mean_length = mean_entity_length(&train),
            "train length before post-filter"
        );
        train = retain_long_entities(train, min_events);
    }
    if train.is_empty() {
        return Err(PrepError::EmptyPartition(SplitLabel::Train));
    }

    let eval = drop_cold(eval, &train, config.eval_requires_train_entity);
    let eval = retain_long_entities(eval, config.min_eval_entity_events);
    debug!(mean_length = mean_entity_length(&eval), "eval length after cold drop");

    let (validation, test) = split_validation_test(eval, config.seed);
    info!(
        train = train.len(),
        validation = validation.len(),
        test = test.len(),
        "partition sizes (events)"
    );
    for (label, part) in [(SplitLabel::Validation, &validation), (SplitLabel::Test, &test)] {
        if part.is_empty() {
            warn!(split = %label, "partition is empty after filtering");
        }
    }

    Ok(Partitions {
        train,
        validation,
        test,
    })
}

fn format_epoch(secs: Timestamp) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}
