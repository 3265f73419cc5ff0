use serde_json::Value;

use super::behavior::{
    ActionIntent, Args, BehaviorIntent, InteractionIntent, MutationIntent, NavigationIntent,
    NormalizeResult,
};
use super::payload::{LegacyParams, RawBehavior};
use super::vocab::{
    is_media_action, state_suffix, InteractionVerb, MutationVerb, NavigationVerb,
    DEFAULT_ACTION_DOMAIN, DURABLE_LIFETIME, LEGACY_ACTION_MARKER, STATE_ACTION_PREFIX,
};

/// Classify any behavior payload into a canonical intent.
///
/// Pure and total: unrecognized input becomes a legacy intent with warnings.
pub fn normalize_behavior_payload(raw: &Value) -> NormalizeResult {
    match RawBehavior::classify(raw) {
        RawBehavior::Canonical { kind } => canonical(kind, raw),
        RawBehavior::Navigation(params) => navigation(params),
        RawBehavior::Interaction(params) => interaction(params),
        RawBehavior::Action(params) => action(params, raw),
        RawBehavior::UnknownType { type_name } => NormalizeResult::unrecognized(
            format!("Unknown behavior type '{type_name}'"),
            raw,
            format!("Unknown behavior payload type \"{type_name}\""),
        ),
        RawBehavior::Untyped => NormalizeResult::unrecognized(
            "Behavior payload without type",
            raw,
            "Behavior payload has no recognizable type or kind",
        ),
        RawBehavior::NotObject => NormalizeResult::unrecognized(
            "Non-object behavior payload",
            raw,
            format!("Behavior payload is not an object: {}", describe(raw)),
        ),
    }
}

fn canonical(kind: &str, raw: &Value) -> NormalizeResult {
    match serde_json::from_value::<BehaviorIntent>(raw.clone()) {
        Ok(mut intent) => {
            keep_extra_fields(&mut intent, raw);
            NormalizeResult::canonical(intent)
        }
        Err(err) => NormalizeResult::unrecognized(
            format!("Malformed canonical {kind} intent"),
            raw,
            format!("Canonical {kind} intent could not be read: {err}"),
        ),
    }
}

/// Wire fields of each canonical shape.
const VERB_VARIANT_FIELDS: &[&str] = &["kind", "verb", "variant", "args"];
const ACTION_FIELDS: &[&str] = &["kind", "domain", "verb", "args"];
const MUTATION_FIELDS: &[&str] = &[
    "kind", "verb", "scope", "lifetime", "target", "valueFrom", "value", "args",
];

/// Move top-level fields the variant has no slot for into `args`, so a
/// canonical pass-through loses nothing. Existing `args` entries win.
fn keep_extra_fields(intent: &mut BehaviorIntent, raw: &Value) {
    let Some(object) = raw.as_object() else {
        return;
    };
    let (fields, args) = match intent {
        BehaviorIntent::Navigation(intent) => (VERB_VARIANT_FIELDS, &mut intent.args),
        BehaviorIntent::Interaction(intent) => (VERB_VARIANT_FIELDS, &mut intent.args),
        BehaviorIntent::Action(intent) => (ACTION_FIELDS, &mut intent.args),
        BehaviorIntent::Mutation(intent) => (MUTATION_FIELDS, &mut intent.args),
        BehaviorIntent::Legacy(_) => return,
    };
    for (name, value) in object {
        if !fields.contains(&name.as_str()) {
            args.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
}

fn navigation(params: LegacyParams) -> NormalizeResult {
    let mut warnings = params_warnings(&params, "Navigation");
    let verb = pick_verb(
        &params,
        NavigationVerb::parse,
        NavigationVerb::Go,
        "navigation",
        &mut warnings,
    );
    let variant = params.str("variant").map(str::to_string);
    NormalizeResult::converted(
        BehaviorIntent::Navigation(NavigationIntent {
            verb,
            variant,
            args: params.map,
        }),
        warnings,
    )
}

fn interaction(params: LegacyParams) -> NormalizeResult {
    let mut warnings = params_warnings(&params, "Interaction");
    let verb = pick_verb(
        &params,
        InteractionVerb::parse,
        InteractionVerb::Tap,
        "interaction",
        &mut warnings,
    );
    let variant = params.str("variant").map(str::to_string);
    NormalizeResult::converted(
        BehaviorIntent::Interaction(InteractionIntent {
            verb,
            variant,
            args: params.map,
        }),
        warnings,
    )
}

fn action(params: LegacyParams, raw: &Value) -> NormalizeResult {
    let Some(name) = params.str("name").map(str::to_string) else {
        let mut result = NormalizeResult::unrecognized(
            "Action without name",
            raw,
            "Action payload missing params.name",
        );
        result.warnings.extend(params_warnings(&params, "Action"));
        return result;
    };

    if let Some(suffix) = name.strip_prefix(STATE_ACTION_PREFIX) {
        return state_mutation(&name, suffix, params);
    }

    if is_media_action(&name) {
        let domain = params
            .str("domain")
            .unwrap_or(DEFAULT_ACTION_DOMAIN)
            .to_string();
        return NormalizeResult::converted(
            BehaviorIntent::Action(ActionIntent {
                domain,
                verb: name,
                args: params.map,
            }),
            Vec::new(),
        );
    }

    NormalizeResult::unrecognized(
        format!("Non-contract action '{name}'"),
        raw,
        format!("Action \"{name}\" is not part of the behavior contract"),
    )
}

fn state_mutation(name: &str, suffix: &str, params: LegacyParams) -> NormalizeResult {
    let mut warnings = Vec::new();
    let (verb, scope) = match state_suffix(suffix) {
        Some(entry) => (entry.verb, Some(entry.scope.to_string())),
        None => {
            warnings.push(format!(
                "Unmapped state action suffix \"{suffix}\"; defaulting to verb \"update\""
            ));
            (MutationVerb::Update, None)
        }
    };

    let target = ["target", "fieldKey", "key"]
        .iter()
        .find_map(|field| params.str(field))
        .map(str::to_string);
    let value_from = params.str("valueFrom").map(str::to_string);
    let value = params.get("value").cloned();

    let mut args: Args = params.map;
    args.insert(
        LEGACY_ACTION_MARKER.to_string(),
        Value::String(name.to_string()),
    );

    NormalizeResult::converted(
        BehaviorIntent::Mutation(MutationIntent {
            verb,
            scope,
            lifetime: Some(DURABLE_LIFETIME.to_string()),
            target,
            value_from,
            value,
            args,
        }),
        warnings,
    )
}

/// Validate `params.verb` against a whitelist: missing means `default`,
/// unknown means `default` plus a warning quoting the offending value.
fn pick_verb<V: Copy>(
    params: &LegacyParams,
    parse: fn(&str) -> Option<V>,
    default: V,
    family: &str,
    warnings: &mut Vec<String>,
) -> V {
    let Some(raw_verb) = params.get("verb") else {
        return default;
    };
    let parsed = raw_verb.as_str().and_then(parse);
    match parsed {
        Some(verb) => verb,
        None => {
            warnings.push(format!(
                "Unknown {family} verb {}; using default",
                describe(raw_verb)
            ));
            default
        }
    }
}

fn params_warnings(params: &LegacyParams, type_name: &str) -> Vec<String> {
    if params.malformed {
        vec![format!("{type_name} payload params is not an object; ignored")]
    } else {
        Vec::new()
    }
}

/// Short rendering of a JSON value for warnings.
pub(super) fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 64 {
        let head: String = text.chars().take(61).collect();
        format!("{head}...")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_payload_passes_through() {
        let raw = json!({"kind": "navigation", "verb": "back", "args": {}});
        let result = normalize_behavior_payload(&raw);
        assert!(!result.legacy);
        assert!(result.warnings.is_empty());
        assert_eq!(result.intent.kind(), "navigation");
        assert_eq!(result.intent.verb(), Some("back"));
    }

    #[test]
    fn canonical_extra_fields_are_kept_in_args() {
        let raw = json!({
            "kind": "mutation", "verb": "update", "target": "x", "value": 1,
            "track": "t", "args": {"track": "inner"}, "note": "kept"
        });
        let result = normalize_behavior_payload(&raw);
        assert!(!result.legacy);
        assert!(result.warnings.is_empty());
        match &result.intent {
            BehaviorIntent::Mutation(intent) => {
                assert_eq!(intent.target.as_deref(), Some("x"));
                assert_eq!(intent.args["track"], json!("inner"));
                assert_eq!(intent.args["note"], json!("kept"));
                assert!(!intent.args.contains_key("kind"));
            }
            other => panic!("expected mutation, got {other:?}"),
        }
    }

    #[test]
    fn malformed_canonical_payload_is_legacy() {
        let raw = json!({"kind": "navigation", "verb": "teleport"});
        let result = normalize_behavior_payload(&raw);
        assert!(result.is_legacy_intent());
        assert!(result.warnings[0].contains("navigation"));
    }

    #[test]
    fn unknown_navigation_verb_defaults_with_warning() {
        let raw = json!({"type": "Navigation", "params": {"verb": "unknown-verb", "to": "x"}});
        let result = normalize_behavior_payload(&raw);
        assert_eq!(result.intent.kind(), "navigation");
        assert_eq!(result.intent.verb(), Some("go"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("unknown-verb"));
        assert!(result.legacy);
    }

    #[test]
    fn missing_navigation_verb_defaults_silently() {
        let raw = json!({"type": "Navigation", "params": {"to": "x"}});
        let result = normalize_behavior_payload(&raw);
        assert_eq!(result.intent.verb(), Some("go"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unknown_interaction_verb_defaults_to_tap() {
        let raw = json!({"type": "Interaction", "params": {"verb": "pinch", "variant": "soft"}});
        let result = normalize_behavior_payload(&raw);
        match &result.intent {
            BehaviorIntent::Interaction(intent) => {
                assert_eq!(intent.verb, InteractionVerb::Tap);
                assert_eq!(intent.variant.as_deref(), Some("soft"));
            }
            other => panic!("expected interaction, got {other:?}"),
        }
        assert!(result.warnings[0].contains("pinch"));
    }

    #[test]
    fn action_without_name() {
        let raw = json!({"type": "Action", "params": {}});
        let result = normalize_behavior_payload(&raw);
        assert!(result.is_legacy_intent());
        assert_eq!(result.warnings, vec!["Action payload missing params.name".to_string()]);
    }

    #[test]
    fn state_action_becomes_mutation() {
        let raw = json!({"type": "Action", "params": {
            "name": "state:journal.add",
            "track": "cleanup",
            "fieldKey": "entry-input",
            "key": "entry",
            "valueFrom": "input"
        }});
        let result = normalize_behavior_payload(&raw);
        assert!(result.warnings.is_empty());
        match &result.intent {
            BehaviorIntent::Mutation(intent) => {
                assert_eq!(intent.verb, MutationVerb::Append);
                assert_eq!(intent.scope.as_deref(), Some("journal"));
                assert_eq!(intent.target.as_deref(), Some("entry-input"));
                assert_eq!(intent.value_from.as_deref(), Some("input"));
                assert_eq!(intent.args["track"], json!("cleanup"));
                assert_eq!(intent.args[LEGACY_ACTION_MARKER], json!("state:journal.add"));
            }
            other => panic!("expected mutation, got {other:?}"),
        }
    }

    #[test]
    fn unmapped_state_suffix_defaults_to_update() {
        let raw = json!({"type": "Action", "params": {"name": "state:journal.remove", "key": "a"}});
        let result = normalize_behavior_payload(&raw);
        assert_eq!(result.intent.verb(), Some("update"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("journal.remove"));
    }

    #[test]
    fn media_action_defaults_domain() {
        let raw = json!({"type": "Action", "params": {"name": "crop", "ratio": "1:1"}});
        let result = normalize_behavior_payload(&raw);
        match &result.intent {
            BehaviorIntent::Action(intent) => {
                assert_eq!(intent.domain, "image");
                assert_eq!(intent.verb, "crop");
                assert_eq!(intent.args["ratio"], json!("1:1"));
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn non_contract_action_is_legacy() {
        let raw = json!({"type": "Action", "params": {"name": "celebrate"}});
        let result = normalize_behavior_payload(&raw);
        assert!(result.is_legacy_intent());
        assert!(result.warnings[0].contains("celebrate"));
    }

    #[test]
    fn non_object_payload_is_legacy() {
        for raw in [json!(null), json!(3), json!("go"), json!([1, 2])] {
            let result = normalize_behavior_payload(&raw);
            assert!(result.is_legacy_intent());
            assert_eq!(result.warnings.len(), 1);
        }
    }

    #[test]
    fn describe_truncates_long_values() {
        let long = json!("x".repeat(200));
        assert!(describe(&long).ends_with("..."));
        assert_eq!(describe(&json!("ok")), "\"ok\"");
    }
}
