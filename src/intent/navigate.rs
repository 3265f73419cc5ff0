use serde_json::{Map, Value};

use super::behavior::{BehaviorIntent, NavigationIntent, NormalizeResult};
use super::normalize::describe;
use super::vocab::NavigationVerb;

/// Variant attached to destination-only navigation.
const SCREEN_VARIANT: &str = "screen";

/// Normalize the `detail` of a navigate event (destination-only contract).
///
/// Accepted forms, in priority order: `{to}` / `{target}`, a canonical
/// `{verb, ...}`, then the legacy `{screenId}`.
pub fn normalize_navigate_detail(detail: &Value) -> NormalizeResult {
    let Some(object) = detail.as_object() else {
        return NormalizeResult::unrecognized(
            "Non-object navigate detail",
            detail,
            format!("navigate detail is not an object: {}", describe(detail)),
        );
    };

    let str_field = |name: &str| object.get(name).and_then(Value::as_str);

    if let Some(to) = str_field("to").or_else(|| str_field("target")) {
        return NormalizeResult::canonical(go_to_screen("to", to));
    }

    if let Some(verb) = str_field("verb").and_then(NavigationVerb::parse) {
        let mut args = object.clone();
        args.remove("verb");
        let variant = args
            .remove("variant")
            .and_then(|value| value.as_str().map(str::to_string));
        return NormalizeResult::canonical(BehaviorIntent::Navigation(NavigationIntent {
            verb,
            variant,
            args,
        }));
    }

    if let Some(screen_id) = str_field("screenId") {
        return NormalizeResult::converted(go_to_screen("screenId", screen_id), Vec::new());
    }

    NormalizeResult::unrecognized(
        "Navigate detail without destination",
        detail,
        "navigate detail missing destination",
    )
}

fn go_to_screen(field: &str, destination: &str) -> BehaviorIntent {
    let mut args = Map::new();
    args.insert(field.to_string(), Value::String(destination.to_string()));
    BehaviorIntent::Navigation(NavigationIntent {
        verb: NavigationVerb::Go,
        variant: Some(SCREEN_VARIANT.to_string()),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn navigation(result: &NormalizeResult) -> &NavigationIntent {
        match &result.intent {
            BehaviorIntent::Navigation(intent) => intent,
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn missing_destination_is_legacy() {
        let result = normalize_navigate_detail(&json!({}));
        assert_eq!(result.intent.kind(), "legacy");
        assert!(result.warnings[0].contains("missing destination"));
    }

    #[test]
    fn to_wins_over_other_fields() {
        let result = normalize_navigate_detail(&json!({"to": "home", "screenId": "other"}));
        assert!(!result.legacy);
        let intent = navigation(&result);
        assert_eq!(intent.verb, NavigationVerb::Go);
        assert_eq!(intent.variant.as_deref(), Some("screen"));
        assert_eq!(intent.args["to"], json!("home"));
    }

    #[test]
    fn target_is_an_alias_for_to() {
        let result = normalize_navigate_detail(&json!({"target": "settings"}));
        assert_eq!(navigation(&result).args["to"], json!("settings"));
    }

    #[test]
    fn known_verb_passes_through() {
        let result = normalize_navigate_detail(&json!({"verb": "back", "variant": "modal"}));
        assert!(!result.legacy);
        let intent = navigation(&result);
        assert_eq!(intent.verb, NavigationVerb::Back);
        assert_eq!(intent.variant.as_deref(), Some("modal"));
        assert!(intent.args.is_empty());
    }

    #[test]
    fn unknown_verb_without_destination_is_legacy() {
        let result = normalize_navigate_detail(&json!({"verb": "warp"}));
        assert!(result.is_legacy_intent());
    }

    #[test]
    fn screen_id_is_legacy_navigation() {
        let result = normalize_navigate_detail(&json!({"screenId": "onboarding-2"}));
        assert!(result.legacy);
        assert!(result.warnings.is_empty());
        assert_eq!(navigation(&result).args["screenId"], json!("onboarding-2"));
    }

    #[test]
    fn non_object_detail_is_legacy() {
        let result = normalize_navigate_detail(&json!("home"));
        assert!(result.is_legacy_intent());
        assert_eq!(result.warnings.len(), 1);
    }
}
