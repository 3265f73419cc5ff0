//! Append-only event log and its persistence.

mod event;
mod event_log;
mod persistence;
mod storage;

pub use event::StateEvent;
pub use event_log::EventLog;
pub use persistence::{
    is_persist_exempt, PersistenceAdapter, RehydrateSource, Rehydrated, DEFAULT_STORAGE_KEY,
    PERSIST_EXEMPT_INTENTS,
};
pub use storage::{
    is_valid_storage_key, FileStorage, MemoryStorage, StorageBackend, StorageError,
};
