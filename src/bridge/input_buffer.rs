use std::collections::HashMap;

use serde_json::Value;

/// Ephemeral field-key → last typed value map.
///
/// Process-local and never persisted; only consulted when an input-sourced
/// mutation cannot be resolved from durable state.
#[derive(Debug, Default)]
pub struct FieldInputBuffer {
    values: HashMap<String, Value>,
    last_field: Option<String>,
}

impl FieldInputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field_key: &str, value: Value) {
        self.values.insert(field_key.to_string(), value);
        self.last_field = Some(field_key.to_string());
    }

    pub fn get(&self, field_key: &str) -> Option<&Value> {
        self.values.get(field_key)
    }

    /// Value of the most recently typed field.
    pub fn last(&self) -> Option<&Value> {
        self.last_field
            .as_deref()
            .and_then(|field| self.values.get(field))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
