//! Persistence adapter: full-log snapshots under one storage key.

use super::event_log::EventLog;
use super::storage::{StorageBackend, StorageError};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "screenflow.eventLog";

/// Intents that do not trigger a write on their own (live input echo).
///
/// Matched by exact name. They are still part of the log and get written out
/// with the next non-exempt dispatch.
pub const PERSIST_EXEMPT_INTENTS: &[&str] = &["state.update"];

pub fn is_persist_exempt(intent: &str) -> bool {
    PERSIST_EXEMPT_INTENTS.contains(&intent)
}

/// Where a rehydrated log came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehydrateSource {
    /// Parsed from storage; `skipped` elements were not event records.
    Stored { events: usize, skipped: usize },
    /// Nothing stored under the key.
    Missing,
    /// The backend failed to read.
    Unreadable,
    /// The stored text was not a JSON array.
    Malformed,
}

/// Result of [`PersistenceAdapter::rehydrate`]; the log is always valid.
#[derive(Debug, Clone)]
pub struct Rehydrated {
    pub log: EventLog,
    pub source: RehydrateSource,
}

/// Serializes the log to storage and loads it back.
///
/// Never returns storage errors to callers: failures are logged and flip the
/// adapter into volatile mode until the next successful write.
pub struct PersistenceAdapter {
    storage: Box<dyn StorageBackend>,
    key: String,
    volatile: bool,
}

impl PersistenceAdapter {
    pub fn new(storage: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            volatile: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True when the last storage operation failed.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Write the whole log. Returns whether the write landed.
    pub fn persist(&mut self, log: &EventLog) -> bool {
        match self.try_persist(log) {
            Ok(()) => {
                if self.volatile {
                    tracing::info!(key = %self.key, "Storage recovered, log persisted");
                }
                self.volatile = false;
                true
            }
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    events = log.len(),
                    error = %err,
                    "Failed to persist event log, continuing in memory"
                );
                self.volatile = true;
                false
            }
        }
    }

    /// Load the persisted log, falling back to an empty one.
    pub fn rehydrate(&mut self) -> Rehydrated {
        let text = match self.storage.read(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(key = %self.key, "No persisted event log");
                return Rehydrated {
                    log: EventLog::new(),
                    source: RehydrateSource::Missing,
                };
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Storage unreadable, starting empty");
                self.volatile = true;
                return Rehydrated {
                    log: EventLog::new(),
                    source: RehydrateSource::Unreadable,
                };
            }
        };

        match EventLog::from_json(&text) {
            Ok((log, skipped)) => {
                if skipped > 0 {
                    tracing::warn!(key = %self.key, skipped, "Skipped malformed persisted events");
                }
                tracing::debug!(key = %self.key, events = log.len(), "Event log rehydrated");
                let events = log.len();
                Rehydrated {
                    log,
                    source: RehydrateSource::Stored { events, skipped },
                }
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Persisted event log is malformed, starting empty");
                Rehydrated {
                    log: EventLog::new(),
                    source: RehydrateSource::Malformed,
                }
            }
        }
    }

    fn try_persist(&self, log: &EventLog) -> Result<(), StorageError> {
        let text = log.to_json().map_err(|err| StorageError::Unavailable {
            reason: format!("log serialization failed: {err}"),
        })?;
        self.storage.write(&self.key, &text)
    }
}
