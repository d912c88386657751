//! Event sources feeding the splitter.

use std::path::PathBuf;

use crate::data::RawEvent;
use crate::errors::PrepError;
use crate::transport::fs::read_raw_events;

/// Pipeline-facing provider of raw events.
///
/// Implementations must return rows in a stable order: row order breaks
/// timestamp ties and drives first-seen vocabulary indices.
pub trait EventSource {
    /// Short label used in logs.
    fn id(&self) -> &str;
    /// Load every event.
    fn load(&self) -> Result<Vec<RawEvent>, PrepError>;
}

/// Tab-separated, headerless `entity item time` file.
#[derive(Clone, Debug)]
pub struct TsvEventSource {
    id: String,
    path: PathBuf,
}

impl TsvEventSource {
    /// Source reading `path`; the path doubles as its id.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            path,
        }
    }
}

impl EventSource for TsvEventSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Vec<RawEvent>, PrepError> {
        read_raw_events(&self.path)
    }
}

/// Prebuilt events held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryEventSource {
    id: String,
    events: Vec<RawEvent>,
}

impl InMemoryEventSource {
    /// Source serving `events` under `id`.
    pub fn new(id: impl Into<String>, events: Vec<RawEvent>) -> Self {
        Self {
            id: id.into(),
            events,
        }
    }
}

impl EventSource for InMemoryEventSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<Vec<RawEvent>, PrepError> {
        Ok(self.events.clone())
    }
}
