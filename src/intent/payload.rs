use serde_json::{Map, Value};

use super::vocab::is_canonical_kind;

/// Closed classification of a raw behavior payload.
///
/// Each legacy shape gets its own variant so the normalizer can match
/// exhaustively instead of probing an untyped value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBehavior<'a> {
    /// `{kind: <canonical tag>, ...}`
    Canonical { kind: &'a str },
    /// `{type: "Navigation", params}`
    Navigation(LegacyParams),
    /// `{type: "Interaction", params}`
    Interaction(LegacyParams),
    /// `{type: "Action", params}`
    Action(LegacyParams),
    /// Object with a string `type` nobody knows.
    UnknownType { type_name: &'a str },
    /// Object without a usable `kind` or `type`.
    Untyped,
    /// Not a JSON object at all.
    NotObject,
}

/// `params` of a legacy payload. A missing or non-object `params` yields an
/// empty map with `malformed` set accordingly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyParams {
    pub map: Map<String, Value>,
    /// `params` was present but not an object.
    pub malformed: bool,
}

impl LegacyParams {
    fn from_raw(raw: &Map<String, Value>) -> Self {
        match raw.get("params") {
            Some(Value::Object(map)) => Self {
                map: map.clone(),
                malformed: false,
            },
            None | Some(Value::Null) => Self::default(),
            Some(_) => Self {
                map: Map::new(),
                malformed: true,
            },
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.map.get(name).and_then(Value::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name).filter(|value| !value.is_null())
    }
}

impl<'a> RawBehavior<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        let Some(object) = raw.as_object() else {
            return Self::NotObject;
        };

        if let Some(kind) = object.get("kind").and_then(Value::as_str) {
            if is_canonical_kind(kind) {
                return Self::Canonical { kind };
            }
        }

        match object.get("type").and_then(Value::as_str) {
            Some("Navigation") => Self::Navigation(LegacyParams::from_raw(object)),
            Some("Interaction") => Self::Interaction(LegacyParams::from_raw(object)),
            Some("Action") => Self::Action(LegacyParams::from_raw(object)),
            Some(type_name) => Self::UnknownType { type_name },
            None => Self::Untyped,
        }
    }
}
