use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Journal track used when an event names none.
pub const DEFAULT_JOURNAL_TRACK: &str = "default";

/// Snapshot obtained by replaying the whole event log.
///
/// Ordered maps keep equality and serialized output independent of insertion
/// order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_view: Option<String>,
    pub journal: BTreeMap<String, BTreeMap<String, Value>>,
    pub values: BTreeMap<String, Value>,
    pub scans: Vec<Value>,
    pub interactions: Vec<Value>,
    /// Number of events replayed, folded or not.
    pub raw_count: usize,
}

impl DerivedState {
    /// Journal entry lookup.
    pub fn journal_entry(&self, track: &str, key: &str) -> Option<&Value> {
        self.journal.get(track).and_then(|entries| entries.get(key))
    }

    /// Durable value lookup.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}
