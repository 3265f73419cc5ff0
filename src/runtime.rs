//! The runtime handle: single writer path over the event log.
//!
//! Every mutation runs append → derive → notify → persist to completion under
//! one lock, so a subscriber that reads state after `dispatch` returns sees the
//! whole effect of that dispatch. The lock is reentrant: a listener calling back
//! into the runtime on the same thread is detected and refused instead of
//! deadlocking, while other threads simply wait their turn.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde_json::{json, Value};

use crate::config::Config;
use crate::derive::{derive, DerivedState};
use crate::diagnostics::Diagnostics;
use crate::hub::{Listener, SubscriptionHub, SubscriptionId};
use crate::log::{
    is_persist_exempt, EventLog, FileStorage, MemoryStorage, PersistenceAdapter, RehydrateSource,
    StateEvent, StorageBackend, DEFAULT_STORAGE_KEY,
};

/// Result of a write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The write landed; `raw_count` is the new log length.
    Applied { raw_count: usize },
    /// A write pass was already running on this thread; nothing changed.
    Rejected,
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Cloneable handle to one runtime instance.
#[derive(Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

struct Shared {
    cell: ReentrantMutex<CoreCell>,
    diagnostics: Diagnostics,
}

struct CoreCell {
    core: RefCell<Core>,
    /// Set for the whole append → derive → notify → persist pass.
    writing: Cell<bool>,
}

struct Core {
    log: EventLog,
    state: Arc<DerivedState>,
    hub: SubscriptionHub,
    persistence: PersistenceAdapter,
}

impl Runtime {
    /// Runtime over `storage`, starting with an empty log.
    ///
    /// Call [`Runtime::rehydrate`] to load what was persisted.
    pub fn new(
        storage: Box<dyn StorageBackend>,
        key: impl Into<String>,
        diagnostics: Diagnostics,
    ) -> Self {
        let core = Core {
            log: EventLog::new(),
            state: Arc::new(DerivedState::default()),
            hub: SubscriptionHub::new(),
            persistence: PersistenceAdapter::new(storage, key),
        };
        Self {
            shared: Arc::new(Shared {
                cell: ReentrantMutex::new(CoreCell {
                    core: RefCell::new(core),
                    writing: Cell::new(false),
                }),
                diagnostics,
            }),
        }
    }

    /// Runtime backed by a private in-memory store.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStorage::new()),
            DEFAULT_STORAGE_KEY,
            Diagnostics::default(),
        )
    }

    /// Runtime wired according to `config` (file storage unless disabled).
    pub fn from_config(config: &Config) -> Self {
        let storage: Box<dyn StorageBackend> = if config.storage.enabled {
            Box::new(FileStorage::new(config.storage.resolved_dir()))
        } else {
            Box::new(MemoryStorage::new())
        };
        Self::new(
            storage,
            config.storage.key.clone(),
            Diagnostics::new(config.diagnostics.capacity),
        )
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.shared.diagnostics
    }

    /// Replace the in-memory log with the persisted one and re-derive.
    ///
    /// Never fails: unreadable or corrupt storage yields an empty log.
    pub fn rehydrate(&self) -> RehydrateSource {
        let cell = self.shared.cell.lock();
        if cell.writing.get() {
            self.refuse("rehydrate", None);
            return RehydrateSource::Unreadable;
        }
        let _writing = begin_write(&cell);

        let rehydrated = cell.core.borrow_mut().persistence.rehydrate();
        let source = rehydrated.source;
        cell.core.borrow_mut().log = rehydrated.log;
        let raw_count = self.rederive(&cell);

        let details = json!({ "source": format!("{source:?}"), "rawCount": raw_count });
        match source {
            RehydrateSource::Stored { .. } | RehydrateSource::Missing => {
                self.shared.diagnostics.pass("rehydrate", Some(details))
            }
            RehydrateSource::Unreadable | RehydrateSource::Malformed => {
                self.shared.diagnostics.fail("rehydrate", Some(details))
            }
        }
        source
    }

    /// Append one event, re-derive, notify subscribers and persist.
    pub fn dispatch(&self, intent: impl Into<String>, payload: Option<Value>) -> DispatchOutcome {
        let event = StateEvent::new(intent, payload);
        let cell = self.shared.cell.lock();
        if cell.writing.get() {
            self.refuse("dispatch", Some(event.intent.as_str()));
            return DispatchOutcome::Rejected;
        }
        let _writing = begin_write(&cell);

        let exempt = is_persist_exempt(&event.intent);
        let intent = event.intent.clone();
        cell.core.borrow_mut().log.append(event);
        let raw_count = self.rederive(&cell);
        if !exempt {
            self.persist_locked(&cell);
        }

        tracing::debug!(intent = %intent, raw_count, persisted = !exempt, "Event dispatched");
        self.shared.diagnostics.pass(
            "dispatch",
            Some(json!({ "intent": intent, "rawCount": raw_count })),
        );
        DispatchOutcome::Applied { raw_count }
    }

    /// Truncate the log to empty, re-derive, notify and persist.
    pub fn clear(&self) -> DispatchOutcome {
        let cell = self.shared.cell.lock();
        if cell.writing.get() {
            self.refuse("clear", None);
            return DispatchOutcome::Rejected;
        }
        let _writing = begin_write(&cell);

        cell.core.borrow_mut().log.clear();
        let raw_count = self.rederive(&cell);
        self.persist_locked(&cell);

        tracing::info!("Event log cleared");
        self.shared.diagnostics.pass("clear", None);
        DispatchOutcome::Applied { raw_count }
    }

    /// Write the current log out regardless of the exemption table.
    pub fn persist(&self) -> bool {
        let cell = self.shared.cell.lock();
        self.persist_locked(&cell)
    }

    /// Latest derived state.
    pub fn state(&self) -> Arc<DerivedState> {
        let cell = self.shared.cell.lock();
        let state = Arc::clone(&cell.core.borrow().state);
        state
    }

    /// Read-only copy of the log.
    pub fn log(&self) -> Vec<StateEvent> {
        let cell = self.shared.cell.lock();
        let events = cell.core.borrow().log.snapshot();
        events
    }

    pub fn len(&self) -> usize {
        let cell = self.shared.cell.lock();
        let len = cell.core.borrow().log.len();
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when storage failed and the log lives in memory only.
    pub fn is_volatile(&self) -> bool {
        let cell = self.shared.cell.lock();
        let volatile = cell.core.borrow().persistence.is_volatile();
        volatile
    }

    pub fn storage_key(&self) -> String {
        let cell = self.shared.cell.lock();
        let key = cell.core.borrow().persistence.key().to_string();
        key
    }

    /// Register a listener called after every successful derive.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DerivedState) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let cell = self.shared.cell.lock();
        let id = cell.core.borrow_mut().hub.subscribe(listener);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let cell = self.shared.cell.lock();
        let removed = cell.core.borrow_mut().hub.unsubscribe(id);
        removed
    }

    /// Full replay of the log, then notification. Returns `raw_count`.
    ///
    /// No `RefCell` borrow is held while listeners run, so they may read
    /// state or manage subscriptions; writes are refused by `writing`.
    fn rederive(&self, cell: &CoreCell) -> usize {
        let (state, listeners) = {
            let mut core = cell.core.borrow_mut();
            let state = Arc::new(derive(core.log.events()));
            debug_assert_eq!(state.raw_count, core.log.len());
            core.state = Arc::clone(&state);
            (state, core.hub.listeners())
        };

        self.shared.diagnostics.pass(
            "derive",
            Some(json!({ "rawCount": state.raw_count, "listeners": listeners.len() })),
        );
        for listener in &listeners {
            listener(&state);
        }
        state.raw_count
    }

    fn persist_locked(&self, cell: &CoreCell) -> bool {
        let mut core = cell.core.borrow_mut();
        let Core {
            log, persistence, ..
        } = &mut *core;
        let written = persistence.persist(log);
        let details = json!({ "key": persistence.key(), "events": log.len() });
        drop(core);

        if written {
            self.shared.diagnostics.pass("persist", Some(details));
        } else {
            self.shared.diagnostics.fail("persist", Some(details));
        }
        written
    }

    fn refuse(&self, operation: &str, intent: Option<&str>) {
        tracing::warn!(
            operation,
            intent = intent.unwrap_or(""),
            "Write refused: a derive pass is already running"
        );
        self.shared.diagnostics.fail(
            operation,
            Some(json!({ "reason": "reentrant write during derive pass", "intent": intent })),
        );
    }
}

/// Raise the write latch until the returned guard drops.
fn begin_write(cell: &CoreCell) -> scopeguard::ScopeGuard<&Cell<bool>, fn(&Cell<bool>)> {
    cell.writing.set(true);
    scopeguard::guard(&cell.writing, release_write as fn(&Cell<bool>))
}

fn release_write(flag: &Cell<bool>) {
    flag.set(false);
}
