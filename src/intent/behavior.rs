use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::vocab::{InteractionVerb, MutationVerb, NavigationVerb, DEFAULT_ACTION_DOMAIN};

/// Free-form intent arguments.
pub type Args = Map<String, Value>;

/// Canonical behavior intent, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BehaviorIntent {
    Navigation(NavigationIntent),
    Mutation(MutationIntent),
    Action(ActionIntent),
    Interaction(InteractionIntent),
    Legacy(LegacyIntent),
}

impl BehaviorIntent {
    /// Wire tag of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Navigation(_) => "navigation",
            Self::Mutation(_) => "mutation",
            Self::Action(_) => "action",
            Self::Interaction(_) => "interaction",
            Self::Legacy(_) => "legacy",
        }
    }

    /// Verb token, when the variant has one.
    pub fn verb(&self) -> Option<&str> {
        match self {
            Self::Navigation(intent) => Some(intent.verb.as_str()),
            Self::Mutation(intent) => Some(intent.verb.as_str()),
            Self::Action(intent) => Some(intent.verb.as_str()),
            Self::Interaction(intent) => Some(intent.verb.as_str()),
            Self::Legacy(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationIntent {
    pub verb: NavigationVerb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default)]
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationIntent {
    pub verb: MutationVerb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionIntent {
    #[serde(default = "default_domain")]
    pub domain: String,
    pub verb: String,
    #[serde(default)]
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionIntent {
    pub verb: InteractionVerb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default)]
    pub args: Args,
}

/// Anything that did not map onto the contract, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyIntent {
    pub description: String,
    #[serde(default)]
    pub raw: Value,
}

fn default_domain() -> String {
    DEFAULT_ACTION_DOMAIN.to_string()
}

/// Outcome of normalization. Never an error: anomalies are reported through
/// `warnings` and the `legacy` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeResult {
    pub intent: BehaviorIntent,
    pub warnings: Vec<String>,
    pub legacy: bool,
}

impl NormalizeResult {
    /// Canonical input passed through as-is.
    pub fn canonical(intent: BehaviorIntent) -> Self {
        Self {
            intent,
            warnings: Vec::new(),
            legacy: false,
        }
    }

    /// A legacy shape successfully mapped onto a contract intent.
    pub fn converted(intent: BehaviorIntent, warnings: Vec<String>) -> Self {
        Self {
            intent,
            warnings,
            legacy: true,
        }
    }

    /// Fallback: keep the raw value and explain why.
    pub fn unrecognized(description: impl Into<String>, raw: &Value, warning: impl Into<String>) -> Self {
        Self {
            intent: BehaviorIntent::Legacy(LegacyIntent {
                description: description.into(),
                raw: raw.clone(),
            }),
            warnings: vec![warning.into()],
            legacy: true,
        }
    }

    pub fn is_legacy_intent(&self) -> bool {
        matches!(self.intent, BehaviorIntent::Legacy(_))
    }
}
