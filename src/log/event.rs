use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded state-affecting event.
///
/// `intent` names the class of event (e.g. `journal.add`); `payload` is kept
/// exactly as dispatched and never validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl StateEvent {
    /// Build an event. A JSON `null` payload is stored as absent so that the
    /// in-memory form matches what a persistence round trip produces.
    pub fn new(intent: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            intent: intent.into(),
            payload: payload.filter(|p| !p.is_null()),
        }
    }

    /// Event without payload.
    pub fn bare(intent: impl Into<String>) -> Self {
        Self::new(intent, None)
    }

    /// Look up a top-level payload field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(name))
    }

    /// Look up a top-level payload field that must be a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}
