/// Raw user or session identifier as it appears in the event log.
/// Examples: `u_1042`, `session:88213`
pub type EntityId = String;
/// Raw item identifier as it appears in the event log.
/// Examples: `214536502`, `venue_77`
pub type ItemId = String;
/// Event time in seconds since the Unix epoch.
/// Example: `1396321112`
pub type Timestamp = i64;
/// Dense vocabulary index. `0` is reserved for padding.
pub type VocabIndex = u32;
/// Dataset name used to derive on-disk paths.
/// Examples: `gowalla`, `yoochoose`
pub type DatasetName = String;
