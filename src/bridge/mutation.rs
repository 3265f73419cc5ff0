//! Turns a mutation intent into exactly one log write.

use serde_json::{Map, Value};

use crate::derive::{names, DerivedState};
use crate::intent::vocab::{state_suffix, LEGACY_ACTION_MARKER, STATE_ACTION_PREFIX};
use crate::intent::{MutationIntent, MutationVerb};

use super::input_buffer::FieldInputBuffer;

/// `valueFrom` token meaning "what the user typed".
pub const INPUT_VALUE_SOURCE: &str = "input";

/// What the bridge will do with the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationPlan {
    Append { intent: String, payload: Value },
    Clear,
}

/// Where the written value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Explicit,
    /// `values[fieldKey]` in derived state.
    Durable,
    /// Ephemeral buffer entry for the field key.
    Buffer,
    /// Most recent buffer entry; no field key was given.
    LastInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMutation {
    pub plan: MutationPlan,
    pub value_source: Option<ValueSource>,
    /// Set when `valueFrom` was requested but nothing resolved.
    pub unresolved: Option<String>,
}

enum Resolved {
    Found(Value, ValueSource),
    Unresolved(String),
    NotRequested,
}

/// Plan the single write for `intent`. `Err` carries why it cannot be routed.
pub fn plan_mutation(
    intent: &MutationIntent,
    state: &DerivedState,
    buffer: &FieldInputBuffer,
) -> Result<PlannedMutation, String> {
    let Some(event) = event_name(intent)? else {
        return Ok(PlannedMutation {
            plan: MutationPlan::Clear,
            value_source: None,
            unresolved: None,
        });
    };

    let target = intent.target.as_deref();
    let field_key = arg_str(intent, "fieldKey").or(target);
    let (value, value_source, unresolved) = match resolve_value(intent, field_key, state, buffer) {
        Resolved::Found(value, source) => (Some(value), Some(source), None),
        Resolved::Unresolved(reason) => (None, None, Some(reason)),
        Resolved::NotRequested => (None, None, None),
    };

    let mut payload = Map::new();
    match event.as_str() {
        names::STATE_UPDATE => {
            let key = target.ok_or("state.update mutation has no target key")?;
            payload.insert("key".to_string(), Value::String(key.to_string()));
            insert_value(&mut payload, value);
        }
        names::JOURNAL_ADD | names::JOURNAL_SET => {
            let key = arg_str(intent, "key")
                .or(target)
                .ok_or("journal mutation has no key")?;
            if let Some(track) = arg_str(intent, "track") {
                payload.insert("track".to_string(), Value::String(track.to_string()));
            }
            payload.insert("key".to_string(), Value::String(key.to_string()));
            insert_value(&mut payload, value);
        }
        names::CURRENT_VIEW => {
            let view = value
                .as_ref()
                .and_then(Value::as_str)
                .or(target)
                .ok_or("currentView mutation has no view")?
                .to_string();
            payload.insert("view".to_string(), Value::String(view));
        }
        _ => {
            payload = intent.args.clone();
            payload.remove(LEGACY_ACTION_MARKER);
            if let Some(target) = target {
                payload
                    .entry("key".to_string())
                    .or_insert_with(|| Value::String(target.to_string()));
            }
            insert_value(&mut payload, value);
        }
    }

    Ok(PlannedMutation {
        plan: MutationPlan::Append {
            intent: event,
            payload: Value::Object(payload),
        },
        value_source,
        unresolved,
    })
}

/// Log intent for `intent`; `Ok(None)` means truncate.
fn event_name(intent: &MutationIntent) -> Result<Option<String>, String> {
    let legacy_suffix = intent
        .args
        .get(LEGACY_ACTION_MARKER)
        .and_then(Value::as_str)
        .and_then(|name| name.strip_prefix(STATE_ACTION_PREFIX));

    if let Some(suffix) = legacy_suffix {
        return match state_suffix(suffix) {
            Some(entry) => Ok(entry.event.map(str::to_string)),
            None if !suffix.is_empty() => Ok(Some(suffix.to_string())),
            None => Err("state action without suffix".to_string()),
        };
    }

    let event = match (intent.verb, intent.scope.as_deref()) {
        (MutationVerb::Clear, _) => return Ok(None),
        (MutationVerb::Append, Some("journal")) => names::JOURNAL_ADD,
        (_, Some("journal")) => names::JOURNAL_SET,
        (_, Some("view")) => names::CURRENT_VIEW,
        (_, Some("scans")) => names::SCAN_RESULT,
        (_, Some("interactions")) => names::INTERACTION_RECORD,
        (MutationVerb::Append, None | Some("values")) => {
            return Err("append mutation needs a journal, scans or interactions scope".to_string())
        }
        (_, None | Some("values")) => names::STATE_UPDATE,
        (_, Some(other)) => return Err(format!("unknown mutation scope '{other}'")),
    };
    Ok(Some(event.to_string()))
}

fn resolve_value(
    intent: &MutationIntent,
    field_key: Option<&str>,
    state: &DerivedState,
    buffer: &FieldInputBuffer,
) -> Resolved {
    if let Some(value) = &intent.value {
        return Resolved::Found(value.clone(), ValueSource::Explicit);
    }

    match intent.value_from.as_deref() {
        None => Resolved::NotRequested,
        Some(INPUT_VALUE_SOURCE) => match field_key {
            Some(key) => {
                if let Some(value) = state.value(key) {
                    Resolved::Found(value.clone(), ValueSource::Durable)
                } else if let Some(value) = buffer.get(key) {
                    Resolved::Found(value.clone(), ValueSource::Buffer)
                } else {
                    Resolved::Unresolved(format!("no input value for field '{key}'"))
                }
            }
            None => match buffer.last() {
                Some(value) => Resolved::Found(value.clone(), ValueSource::LastInput),
                None => Resolved::Unresolved("no field key and no typed input".to_string()),
            },
        },
        Some(other) => Resolved::Unresolved(format!("unsupported valueFrom '{other}'")),
    }
}

fn arg_str<'a>(intent: &'a MutationIntent, name: &str) -> Option<&'a str> {
    intent.args.get(name).and_then(Value::as_str)
}

fn insert_value(payload: &mut Map<String, Value>, value: Option<Value>) {
    if let Some(value) = value {
        payload.insert("value".to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{normalize_behavior_payload, Args, BehaviorIntent};
    use serde_json::json;

    fn mutation(raw: Value) -> MutationIntent {
        match normalize_behavior_payload(&raw).intent {
            BehaviorIntent::Mutation(intent) => intent,
            other => panic!("expected mutation, got {other:?}"),
        }
    }

    fn canonical(verb: MutationVerb, scope: Option<&str>) -> MutationIntent {
        MutationIntent {
            verb,
            scope: scope.map(str::to_string),
            lifetime: None,
            target: Some("k".to_string()),
            value_from: None,
            value: Some(json!(1)),
            args: Args::new(),
        }
    }

    fn append_of(planned: &PlannedMutation) -> (&str, &Value) {
        match &planned.plan {
            MutationPlan::Append { intent, payload } => (intent.as_str(), payload),
            MutationPlan::Clear => panic!("expected append"),
        }
    }

    #[test]
    fn legacy_update_uses_target_as_key() {
        let intent = mutation(json!({"type": "Action", "params": {"name": "state:update", "key": "x", "value": 1}}));
        let planned = plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        let (name, payload) = append_of(&planned);
        assert_eq!(name, "state.update");
        assert_eq!(payload, &json!({"key": "x", "value": 1}));
        assert_eq!(planned.value_source, Some(ValueSource::Explicit));
    }

    #[test]
    fn journal_input_prefers_durable_value() {
        let intent = mutation(json!({"type": "Action", "params": {
            "name": "state:journal.add", "track": "cleanup", "key": "entry",
            "fieldKey": "entry-input", "valueFrom": "input"
        }}));
        let mut state = DerivedState::default();
        state.values.insert("entry-input".to_string(), json!("durable"));
        let mut buffer = FieldInputBuffer::new();
        buffer.record("entry-input", json!("typed"));

        let planned = plan_mutation(&intent, &state, &buffer).unwrap();
        let (name, payload) = append_of(&planned);
        assert_eq!(name, "journal.add");
        assert_eq!(
            payload,
            &json!({"track": "cleanup", "key": "entry", "value": "durable"})
        );
        assert_eq!(planned.value_source, Some(ValueSource::Durable));
    }

    #[test]
    fn input_falls_back_to_buffer_then_unresolved() {
        let intent = mutation(json!({"type": "Action", "params": {
            "name": "state:journal.add", "key": "entry", "fieldKey": "note", "valueFrom": "input"
        }}));
        let mut buffer = FieldInputBuffer::new();
        buffer.record("note", json!("typed"));
        let planned = plan_mutation(&intent, &DerivedState::default(), &buffer).unwrap();
        assert_eq!(planned.value_source, Some(ValueSource::Buffer));

        let planned =
            plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        assert!(planned.unresolved.as_deref().unwrap().contains("note"));
        let (_, payload) = append_of(&planned);
        assert!(payload.get("value").is_none());
    }

    #[test]
    fn input_without_field_key_uses_last_typed_value() {
        let intent = MutationIntent {
            verb: MutationVerb::Append,
            scope: Some("scans".to_string()),
            lifetime: None,
            target: None,
            value_from: Some("input".to_string()),
            value: None,
            args: Args::new(),
        };
        let mut buffer = FieldInputBuffer::new();
        buffer.record("a", json!("first"));
        buffer.record("b", json!("second"));
        let planned = plan_mutation(&intent, &DerivedState::default(), &buffer).unwrap();
        assert_eq!(planned.value_source, Some(ValueSource::LastInput));
        let (name, payload) = append_of(&planned);
        assert_eq!(name, "scan.result");
        assert_eq!(payload, &json!({"value": "second"}));
    }

    #[test]
    fn canonical_scopes_route_to_fold_rules() {
        let empty = (DerivedState::default(), FieldInputBuffer::new());
        let cases = [
            (MutationVerb::Update, None, "state.update"),
            (MutationVerb::Update, Some("values"), "state.update"),
            (MutationVerb::Append, Some("journal"), "journal.add"),
            (MutationVerb::Replace, Some("journal"), "journal.set"),
            (MutationVerb::Replace, Some("view"), "state:currentView"),
            (MutationVerb::Append, Some("interactions"), "interaction.record"),
        ];
        for (verb, scope, expected) in cases {
            let planned = plan_mutation(&canonical(verb, scope), &empty.0, &empty.1).unwrap();
            assert_eq!(append_of(&planned).0, expected);
        }
    }

    #[test]
    fn unroutable_canonical_mutations() {
        let empty = (DerivedState::default(), FieldInputBuffer::new());
        assert!(plan_mutation(&canonical(MutationVerb::Append, None), &empty.0, &empty.1).is_err());
        assert!(
            plan_mutation(&canonical(MutationVerb::Update, Some("cache")), &empty.0, &empty.1)
                .is_err()
        );
    }

    #[test]
    fn clear_plans_truncation() {
        let intent = mutation(json!({"type": "Action", "params": {"name": "state:clear"}}));
        let planned = plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        assert_eq!(planned.plan, MutationPlan::Clear);
    }

    #[test]
    fn unmapped_suffix_is_recorded_verbatim() {
        let intent = mutation(json!({"type": "Action", "params": {
            "name": "state:journal.remove", "key": "entry", "track": "t"
        }}));
        let planned = plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        let (name, payload) = append_of(&planned);
        assert_eq!(name, "journal.remove");
        assert_eq!(payload, &json!({"name": "state:journal.remove", "key": "entry", "track": "t"}));
    }

    #[test]
    fn current_view_from_value_or_target() {
        let intent = mutation(json!({"type": "Action", "params": {"name": "state:currentView", "value": "home"}}));
        let planned = plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        assert_eq!(append_of(&planned).1, &json!({"view": "home"}));

        let intent = mutation(json!({"type": "Action", "params": {"name": "state:currentView", "target": "settings"}}));
        let planned = plan_mutation(&intent, &DerivedState::default(), &FieldInputBuffer::new()).unwrap();
        assert_eq!(append_of(&planned).1, &json!({"view": "settings"}));
    }
}
