//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use parking_lot::Mutex;
use screenflow::bridge::{DispatchBridge, UiEvent};
use screenflow::diagnostics::Diagnostics;
use screenflow::log::{FileStorage, MemoryStorage, DEFAULT_STORAGE_KEY};
use screenflow::Runtime;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub type Visits = Arc<Mutex<Vec<String>>>;

/// Runtime over a shared in-memory store; the store handle lets tests
/// inspect what was written.
pub fn memory_runtime() -> (Runtime, MemoryStorage) {
    let storage = MemoryStorage::new();
    let runtime = Runtime::new(
        Box::new(storage.clone()),
        DEFAULT_STORAGE_KEY,
        Diagnostics::default(),
    );
    (runtime, storage)
}

/// Runtime persisting into a fresh temp directory.
pub fn file_runtime() -> (Runtime, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let runtime = runtime_in(temp_dir.path().to_path_buf());
    (runtime, temp_dir)
}

pub fn runtime_in(dir: PathBuf) -> Runtime {
    Runtime::new(
        Box::new(FileStorage::new(dir)),
        DEFAULT_STORAGE_KEY,
        Diagnostics::default(),
    )
}

/// Installed bridge whose navigator records every destination.
pub fn recording_bridge(runtime: Runtime) -> (DispatchBridge, Visits) {
    let visits: Visits = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&visits);
    let bridge = DispatchBridge::new(runtime).with_navigator(move |to| seen.lock().push(to.to_string()));
    assert!(bridge.install());
    (bridge, visits)
}

pub fn action(payload: Value) -> UiEvent {
    UiEvent::Action(payload)
}

pub fn typed(field_key: &str, value: Value) -> UiEvent {
    UiEvent::FieldInput {
        field_key: field_key.to_string(),
        value,
    }
}
