use std::path::PathBuf;

use crate::constants::filter::{
    MIN_ITEM_SUPPORT, SEQUENTIAL_MIN_ENTITY_EVENTS, SESSION_MIN_ENTITY_EVENTS,
};
use crate::constants::layout::DEFAULT_DATA_DIR;
use crate::constants::splits::{
    DEFAULT_SPLIT_SEED, SEQUENTIAL_MIN_EVAL_EVENTS, SEQUENTIAL_MIN_TRAIN_EVENTS,
    SEQUENTIAL_TRAIN_FRACTION, SESSION_EVAL_WINDOW_DAYS, SESSION_MIN_EVAL_EVENTS,
};
use crate::errors::PrepError;
use crate::filter::FilterThresholds;
use crate::splits::PivotRule;
use crate::vocab::VocabularyOrder;

/// Preset families of filter + split parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitVariant {
    /// Session-based logs: whole sessions go to train or eval by their last event.
    Session,
    /// Long-lived user histories: individual events go to train or eval by time.
    Sequential,
}

/// Parameters of the filter + chronological split.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitConfig {
    /// Sparse filter thresholds applied before partitioning.
    pub filter: FilterThresholds,
    /// How the train/eval boundary is drawn.
    pub pivot: PivotRule,
    /// Train entities must keep more than this many events, when set.
    pub min_train_entity_events: Option<usize>,
    /// Eval entities must keep more than this many events after the cold-start drop.
    pub min_eval_entity_events: usize,
    /// Drop eval entities that have no training events.
    pub eval_requires_train_entity: bool,
    /// Seed for the validation/test coin flip.
    pub seed: u64,
}

impl SplitConfig {
    /// Session-based preset (last two days held out per session).
    pub fn session() -> Self {
        Self {
            filter: FilterThresholds {
                min_entity_events: SESSION_MIN_ENTITY_EVENTS,
                min_item_support: MIN_ITEM_SUPPORT,
            },
            pivot: PivotRule::EntityLastEvent {
                window_secs: chrono::Duration::days(SESSION_EVAL_WINDOW_DAYS).num_seconds(),
            },
            min_train_entity_events: None,
            min_eval_entity_events: SESSION_MIN_EVAL_EVENTS,
            eval_requires_train_entity: false,
            seed: DEFAULT_SPLIT_SEED,
        }
    }

    /// Sequential preset (last 10% of the time span held out per event).
    pub fn sequential() -> Self {
        Self {
            filter: FilterThresholds {
                min_entity_events: SEQUENTIAL_MIN_ENTITY_EVENTS,
                min_item_support: MIN_ITEM_SUPPORT,
            },
            pivot: PivotRule::GlobalFraction {
                train_fraction: SEQUENTIAL_TRAIN_FRACTION,
            },
            min_train_entity_events: Some(SEQUENTIAL_MIN_TRAIN_EVENTS),
            min_eval_entity_events: SEQUENTIAL_MIN_EVAL_EVENTS,
            eval_requires_train_entity: true,
            seed: DEFAULT_SPLIT_SEED,
        }
    }

    /// Preset for `variant`.
    pub fn for_variant(variant: SplitVariant) -> Self {
        match variant {
            SplitVariant::Session => Self::session(),
            SplitVariant::Sequential => Self::sequential(),
        }
    }

    /// Replace the validation/test split seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject parameter combinations that cannot produce a meaningful split.
    pub fn validate(&self) -> Result<(), PrepError> {
        match self.pivot {
            PivotRule::EntityLastEvent { window_secs } if window_secs < 0 => {
                Err(PrepError::Configuration(
                    "eval window must not be negative".to_string(),
                ))
            }
            PivotRule::GlobalFraction { train_fraction }
                if !(train_fraction > 0.0 && train_fraction <= 1.0) =>
            {
                Err(PrepError::Configuration(format!(
                    "train fraction must be in (0, 1], got {train_fraction}"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Top-level configuration of a dataset-preparation run.
#[derive(Clone, Debug)]
pub struct PrepConfig {
    /// Root holding one sub-directory per dataset.
    pub data_dir: PathBuf,
    /// Filter + split parameters.
    pub split: SplitConfig,
    /// Index assignment order for both vocabularies.
    pub vocab_order: VocabularyOrder,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            split: SplitConfig::default(),
            vocab_order: VocabularyOrder::FirstSeen,
        }
    }
}
