use crate::types::VocabIndex;

/// Constants shared by vocabulary construction and padding.
pub mod vocab {
    use super::VocabIndex;

    /// Index used for padding positions in evaluation arrays.
    pub const PAD_INDEX: VocabIndex = 0;
    /// First index handed out to a real identifier.
    pub const FIRST_INDEX: VocabIndex = 1;
}

/// Default thresholds for the sparse-entity / sparse-item filter.
pub mod filter {
    /// Session variant: sessions must have more than this many events.
    pub const SESSION_MIN_ENTITY_EVENTS: usize = 2;
    /// Sequential variant: users must have more than this many events.
    pub const SEQUENTIAL_MIN_ENTITY_EVENTS: usize = 10;
    /// Items must be referenced by at least this many events.
    pub const MIN_ITEM_SUPPORT: usize = 10;
}

/// Defaults for chronological partitioning.
pub mod splits {
    /// Session variant: sessions ending within this many days of the last event are held out.
    pub const SESSION_EVAL_WINDOW_DAYS: i64 = 2;
    /// Sequential variant: fraction of the time span kept for training.
    pub const SEQUENTIAL_TRAIN_FRACTION: f64 = 0.9;
    /// Sequential variant: train users must keep more than this many events.
    pub const SEQUENTIAL_MIN_TRAIN_EVENTS: usize = 3;
    /// Session variant: eval sessions must keep more than this many events.
    pub const SESSION_MIN_EVAL_EVENTS: usize = 2;
    /// Sequential variant: eval users must keep more than this many events.
    pub const SEQUENTIAL_MIN_EVAL_EVENTS: usize = 3;
    /// Default seed for the validation/test coin flip.
    pub const DEFAULT_SPLIT_SEED: u64 = 42;
}

/// Defaults for evaluation batching.
pub mod batching {
    /// Default fixed width of input/target rows.
    pub const DEFAULT_MAX_SEQ_LEN: usize = 100;
    /// Requested batch sizes below this are raised to it.
    pub const MIN_BATCH_SIZE: usize = 2;
}

/// On-disk naming of inputs and artifacts.
pub mod layout {
    /// Default root directory holding one sub-directory per dataset.
    pub const DEFAULT_DATA_DIR: &str = "data";
    /// Extension of the raw, headerless event log.
    pub const RAW_EXTENSION: &str = "tsv";
    /// Suffix of the training partition table.
    pub const TRAIN_SUFFIX: &str = "_train_tr";
    /// Suffix of the validation partition table.
    pub const VALIDATION_SUFFIX: &str = "_train_valid";
    /// Suffix of the test partition table.
    pub const TEST_SUFFIX: &str = "_test";
    /// Extension of partition tables.
    pub const PARTITION_EXTENSION: &str = "txt";
    /// Extension of encoded partitions and vocabularies.
    pub const JSON_EXTENSION: &str = "json";
    /// Suffix of the persisted item vocabulary.
    pub const ITEM_VOCAB_SUFFIX: &str = "_item_dict";
    /// Suffix of the persisted entity vocabulary.
    pub const ENTITY_VOCAB_SUFFIX: &str = "_user_dict";
    /// Header written to partition tables.
    pub const PARTITION_HEADER: [&str; 3] = ["UserId", "ItemId", "Time"];
    /// Field delimiter for every tabular file.
    pub const DELIMITER: u8 = b'\t';
}
