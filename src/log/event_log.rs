use serde_json::Value;

use super::event::StateEvent;

/// Ordered, append-only sequence of [`StateEvent`]s.
///
/// The only ways to change it are [`EventLog::append`] and a wholesale
/// [`EventLog::clear`]; events are never edited, removed or reordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<StateEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<StateEvent>) -> Self {
        Self { events }
    }

    /// Append one event and return the new length.
    pub fn append(&mut self, event: StateEvent) -> usize {
        self.events.push(event);
        self.events.len()
    }

    /// Truncate to empty.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Read-only copy of the current log.
    pub fn snapshot(&self) -> Vec<StateEvent> {
        self.events.clone()
    }

    pub fn events(&self) -> &[StateEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialize as a JSON array in chronological order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }

    /// Parse a persisted JSON array.
    ///
    /// The array itself must parse; individual elements that are not
    /// `{intent, payload?}` records are skipped. Returns the log and the
    /// number of skipped elements.
    pub fn from_json(text: &str) -> Result<(Self, usize), serde_json::Error> {
        let items: Vec<Value> = serde_json::from_str(text)?;
        let mut skipped = 0;
        let events = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<StateEvent>(item) {
                Ok(event) => Some(StateEvent::new(event.intent, event.payload)),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        Ok((Self { events }, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_grows_by_one() {
        let mut log = EventLog::new();
        assert_eq!(log.append(StateEvent::bare("a")), 1);
        assert_eq!(log.append(StateEvent::bare("b")), 2);
        assert_eq!(log.events()[0].intent, "a");
        assert_eq!(log.events()[1].intent, "b");
    }

    #[test]
    fn snapshot_is_detached() {
        let mut log = EventLog::new();
        log.append(StateEvent::bare("a"));
        let snapshot = log.snapshot();
        log.append(StateEvent::bare("b"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn from_json_skips_foreign_elements() {
        let text = r#"[{"intent":"a"},42,{"payload":{}},{"intent":"b","payload":{"x":1}}]"#;
        let (log, skipped) = EventLog::from_json(text).unwrap();
        assert_eq!(skipped, 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].payload, Some(json!({"x": 1})));
    }

    #[test]
    fn from_json_rejects_non_array() {
        assert!(EventLog::from_json(r#"{"intent":"a"}"#).is_err());
        assert!(EventLog::from_json("not json").is_err());
    }
}
