//! Input/output transports used by the pipeline (filesystem today).

/// Delimited-text and JSON files with staged, rename-on-commit writes.
pub mod fs;
