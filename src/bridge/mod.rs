//! Single entry point between UI events and the runtime.
//!
//! Each event is normalized into a [`BehaviorIntent`] and produces at most one
//! effect: a log write, a navigation, or a delegated call to an external
//! executor. Every decision is recorded as a diagnostics stage.

pub mod executor;
pub mod input_buffer;
pub mod latch;
pub mod mutation;

pub use executor::{
    ActionDescriptor, ContractExecutor, ExecutorError, LazyInterpreter, NavigationContext,
    Navigator, RuntimeInterpreter,
};
pub use input_buffer::FieldInputBuffer;
pub use latch::{InFlightLatch, InstallLatch};
pub use mutation::{plan_mutation, MutationPlan, PlannedMutation, ValueSource};

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::derive::names;
use crate::diagnostics::Diagnostics;
use crate::intent::{
    normalize_behavior_payload, normalize_navigate_detail, ActionIntent, Args, BehaviorIntent,
    InteractionIntent, LegacyIntent, MutationIntent, NavigationIntent, NormalizeResult,
};
use crate::runtime::{DispatchOutcome, Runtime};

/// Typed UI events accepted by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A behavior payload attached to a component.
    Action(Value),
    /// A navigate request detail (`{to}`, `{verb, ...}`, `{screenId}`).
    Navigate(Value),
    /// The user typed into a field.
    FieldInput { field_key: String, value: Value },
}

/// What a single event ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeOutcome {
    NotInstalled,
    Mutated { raw_count: usize },
    Cleared,
    Navigated { to: String },
    Delegated,
    Failed { reason: String },
    Ignored { reason: String },
    Rejected { reason: String },
}

/// Routes UI events into the runtime, the navigator or an executor.
pub struct DispatchBridge {
    runtime: Runtime,
    navigator: Option<Navigator>,
    contract: Option<Arc<dyn ContractExecutor>>,
    interpreter: Option<LazyInterpreter>,
    input: Mutex<FieldInputBuffer>,
    install: InstallLatch,
    delegated: InFlightLatch,
}

impl DispatchBridge {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            navigator: None,
            contract: None,
            interpreter: None,
            input: Mutex::new(FieldInputBuffer::new()),
            install: InstallLatch::default(),
            delegated: InFlightLatch::default(),
        }
    }

    pub fn with_navigator<F>(mut self, navigator: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    pub fn with_contract_executor(mut self, executor: Arc<dyn ContractExecutor>) -> Self {
        self.contract = Some(executor);
        self
    }

    pub fn with_interpreter(mut self, interpreter: LazyInterpreter) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    /// Activate the bridge. Only the first call does anything.
    pub fn install(&self) -> bool {
        let first = self.install.install();
        let attempts = self.install.install_count();
        if first {
            tracing::debug!("Dispatch bridge installed");
            self.diagnostics().pass("install", Some(json!({ "attempts": attempts })));
        } else {
            tracing::debug!(attempts, "Dispatch bridge already installed");
            self.diagnostics().pass(
                "install",
                Some(json!({ "attempts": attempts, "duplicate": true })),
            );
        }
        first
    }

    pub fn is_installed(&self) -> bool {
        self.install.is_installed()
    }

    /// Number of `install()` calls so far, including ignored ones.
    pub fn install_count(&self) -> usize {
        self.install.install_count()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Ephemeral value typed into `field_key`, if any.
    pub fn input_value(&self, field_key: &str) -> Option<Value> {
        self.input.lock().get(field_key).cloned()
    }

    pub fn handle(&self, event: UiEvent) -> BridgeOutcome {
        if !self.install.is_installed() {
            tracing::debug!("Event ignored: bridge not installed");
            self.diagnostics()
                .fail("install", Some(json!({ "reason": "bridge not installed" })));
            return BridgeOutcome::NotInstalled;
        }

        match event {
            UiEvent::Action(payload) => {
                let result = normalize_behavior_payload(&payload);
                self.report_normalize("action", &result);
                self.route(result.intent)
            }
            UiEvent::Navigate(detail) => {
                let result = normalize_navigate_detail(&detail);
                self.report_normalize("navigate", &result);
                self.route(result.intent)
            }
            UiEvent::FieldInput { field_key, value } => self.field_input(field_key, value),
        }
    }

    fn route(&self, intent: BehaviorIntent) -> BridgeOutcome {
        match intent {
            BehaviorIntent::Mutation(intent) => self.mutate(&intent),
            BehaviorIntent::Navigation(intent) => self.navigate(&intent),
            BehaviorIntent::Interaction(intent) => self.record_interaction(&intent),
            BehaviorIntent::Action(intent) => self.delegate_contract(&intent),
            BehaviorIntent::Legacy(intent) => self.delegate_legacy(&intent),
        }
    }

    fn field_input(&self, field_key: String, value: Value) -> BridgeOutcome {
        self.input.lock().record(&field_key, value.clone());
        let payload = json!({ "key": field_key, "value": value });
        self.applied(self.runtime.dispatch(names::STATE_UPDATE, Some(payload)))
    }

    fn mutate(&self, intent: &MutationIntent) -> BridgeOutcome {
        let state = self.runtime.state();
        let planned = {
            let input = self.input.lock();
            plan_mutation(intent, &state, &input)
        };
        let planned = match planned {
            Ok(planned) => planned,
            Err(reason) => {
                tracing::warn!(verb = intent.verb.as_str(), reason = %reason, "Mutation not routed");
                self.diagnostics()
                    .fail("mutation", Some(json!({ "reason": reason })));
                return BridgeOutcome::Failed { reason };
            }
        };

        if let Some(reason) = &planned.unresolved {
            tracing::warn!(reason = %reason, "Input value unresolved");
            self.diagnostics()
                .fail("input", Some(json!({ "reason": reason })));
        } else if let Some(source) = planned.value_source {
            self.diagnostics()
                .pass("input", Some(json!({ "source": format!("{source:?}") })));
        }

        match planned.plan {
            MutationPlan::Append { intent, payload } => {
                self.applied(self.runtime.dispatch(intent, Some(payload)))
            }
            MutationPlan::Clear => match self.runtime.clear() {
                DispatchOutcome::Applied { .. } => BridgeOutcome::Cleared,
                DispatchOutcome::Rejected => BridgeOutcome::Rejected {
                    reason: "write already in progress".to_string(),
                },
            },
        }
    }

    fn navigate(&self, intent: &NavigationIntent) -> BridgeOutcome {
        let destination = ["to", "target", "screenId"]
            .iter()
            .find_map(|key| intent.args.get(*key).and_then(Value::as_str));

        let Some(to) = destination else {
            let reason = "navigation has no destination".to_string();
            tracing::warn!(verb = intent.verb.as_str(), "Navigation has no destination");
            self.diagnostics().fail(
                "navigate",
                Some(json!({ "verb": intent.verb.as_str(), "reason": reason })),
            );
            return BridgeOutcome::Ignored { reason };
        };

        let Some(navigator) = &self.navigator else {
            let reason = "no navigator configured".to_string();
            tracing::warn!(to, "No navigator configured");
            self.diagnostics()
                .fail("navigate", Some(json!({ "to": to, "reason": reason })));
            return BridgeOutcome::Ignored { reason };
        };

        navigator(to);
        self.diagnostics().pass(
            "navigate",
            Some(json!({ "verb": intent.verb.as_str(), "to": to })),
        );
        BridgeOutcome::Navigated { to: to.to_string() }
    }

    fn record_interaction(&self, intent: &InteractionIntent) -> BridgeOutcome {
        let payload = match serde_json::to_value(intent) {
            Ok(payload) => payload,
            Err(e) => {
                let reason = format!("interaction not serializable: {e}");
                self.diagnostics()
                    .fail("interaction", Some(json!({ "reason": reason })));
                return BridgeOutcome::Failed { reason };
            }
        };
        self.applied(self.runtime.dispatch(names::INTERACTION_RECORD, Some(payload)))
    }

    fn delegate_contract(&self, intent: &ActionIntent) -> BridgeOutcome {
        let Some(executor) = &self.contract else {
            return self.no_executor(&intent.verb);
        };
        let Some(_in_flight) = self.delegated.try_enter() else {
            return self.reject_delegated(&intent.verb);
        };

        let context = NavigationContext::new(self.navigator.clone(), self.runtime.state());
        let result = executor.execute(&intent.domain, &intent.verb, &context, &intent.args);
        self.delegated_result(&intent.verb, result)
    }

    fn delegate_legacy(&self, intent: &LegacyIntent) -> BridgeOutcome {
        let Some(descriptor) = legacy_descriptor(&intent.raw) else {
            let reason = intent.description.clone();
            tracing::debug!(description = %reason, "Legacy intent without action name ignored");
            self.diagnostics()
                .pass("delegate", Some(json!({ "ignored": reason })));
            return BridgeOutcome::Ignored { reason };
        };

        let Some(interpreter) = self.interpreter.as_ref().and_then(LazyInterpreter::get) else {
            return self.no_executor(&descriptor.name);
        };
        let Some(_in_flight) = self.delegated.try_enter() else {
            return self.reject_delegated(&descriptor.name);
        };

        let state = self.runtime.state();
        let result = interpreter.interpret(&descriptor, &state);
        self.delegated_result(&descriptor.name, result)
    }

    fn delegated_result(&self, action: &str, result: Result<(), ExecutorError>) -> BridgeOutcome {
        match result {
            Ok(()) => {
                self.diagnostics()
                    .pass("delegate", Some(json!({ "action": action })));
                BridgeOutcome::Delegated
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "Delegated action failed");
                let reason = e.to_string();
                self.diagnostics().fail(
                    "delegate",
                    Some(json!({ "action": action, "reason": reason })),
                );
                BridgeOutcome::Failed { reason }
            }
        }
    }

    fn no_executor(&self, action: &str) -> BridgeOutcome {
        let reason = format!("no executor configured for '{action}'");
        tracing::warn!(action, "No executor configured");
        self.diagnostics()
            .fail("delegate", Some(json!({ "action": action, "reason": reason })));
        BridgeOutcome::Ignored { reason }
    }

    fn reject_delegated(&self, action: &str) -> BridgeOutcome {
        let reason = "delegated action already in flight".to_string();
        tracing::warn!(action, "Delegated action rejected: another is in flight");
        self.diagnostics()
            .fail("delegate", Some(json!({ "action": action, "reason": reason })));
        BridgeOutcome::Rejected { reason }
    }

    fn applied(&self, outcome: DispatchOutcome) -> BridgeOutcome {
        match outcome {
            DispatchOutcome::Applied { raw_count } => BridgeOutcome::Mutated { raw_count },
            DispatchOutcome::Rejected => BridgeOutcome::Rejected {
                reason: "write already in progress".to_string(),
            },
        }
    }

    fn report_normalize(&self, source: &str, result: &NormalizeResult) {
        for warning in &result.warnings {
            tracing::warn!(source, warning = %warning, "Behavior normalized with warning");
        }
        let details = json!({
            "source": source,
            "kind": result.intent.kind(),
            "verb": result.intent.verb(),
            "legacy": result.legacy,
            "warnings": result.warnings,
        });
        if result.warnings.is_empty() {
            self.diagnostics().pass("normalize", Some(details));
        } else {
            self.diagnostics().fail("normalize", Some(details));
        }
    }

    fn diagnostics(&self) -> &Diagnostics {
        self.runtime.diagnostics()
    }
}

/// `{name, ...params}` from a raw `{type:"Action", params:{name}}` payload.
fn legacy_descriptor(raw: &Value) -> Option<ActionDescriptor> {
    let params = raw.get("params")?.as_object()?;
    let name = params.get("name")?.as_str()?.to_string();
    let params: Args = params
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Some(ActionDescriptor { name, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::DerivedState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn installed() -> DispatchBridge {
        let bridge = DispatchBridge::new(Runtime::in_memory());
        bridge.install();
        bridge
    }

    struct Counting(Arc<AtomicUsize>);

    impl RuntimeInterpreter for Counting {
        fn interpret(&self, _action: &ActionDescriptor, _state: &DerivedState) -> Result<(), ExecutorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn events_before_install_are_ignored() {
        let bridge = DispatchBridge::new(Runtime::in_memory());
        let outcome = bridge.handle(UiEvent::FieldInput {
            field_key: "name".into(),
            value: json!("x"),
        });
        assert_eq!(outcome, BridgeOutcome::NotInstalled);
        assert!(bridge.runtime().is_empty());
    }

    #[test]
    fn field_input_buffers_and_echoes() {
        let bridge = installed();
        let outcome = bridge.handle(UiEvent::FieldInput {
            field_key: "name".into(),
            value: json!("Ada"),
        });
        assert_eq!(outcome, BridgeOutcome::Mutated { raw_count: 1 });
        assert_eq!(bridge.input_value("name"), Some(json!("Ada")));
        assert_eq!(bridge.runtime().state().value("name"), Some(&json!("Ada")));
    }

    #[test]
    fn state_clear_truncates_log() {
        let bridge = installed();
        bridge.runtime().dispatch("journal.add", Some(json!({"key": "a", "value": 1})));
        let outcome = bridge.handle(UiEvent::Action(
            json!({"type": "Action", "params": {"name": "state:clear"}}),
        ));
        assert_eq!(outcome, BridgeOutcome::Cleared);
        assert!(bridge.runtime().is_empty());
    }

    #[test]
    fn interaction_is_recorded_once() {
        let bridge = installed();
        let outcome = bridge.handle(UiEvent::Action(
            json!({"type": "Interaction", "params": {"verb": "swipe", "direction": "left"}}),
        ));
        assert_eq!(outcome, BridgeOutcome::Mutated { raw_count: 1 });
        let log = bridge.runtime().log();
        assert_eq!(log[0].intent, "interaction.record");
        assert_eq!(bridge.runtime().state().interactions.len(), 1);
    }

    #[test]
    fn legacy_without_interpreter_is_ignored() {
        let bridge = installed();
        let outcome = bridge.handle(UiEvent::Action(
            json!({"type": "Action", "params": {"name": "sparkle"}}),
        ));
        assert!(matches!(outcome, BridgeOutcome::Ignored { .. }));
        assert!(bridge.runtime().is_empty());
    }

    #[test]
    fn interpreter_receives_non_contract_names() {
        let calls = Arc::new(AtomicUsize::new(0));
        let interpreter = Counting(Arc::clone(&calls));
        let bridge = DispatchBridge::new(Runtime::in_memory())
            .with_interpreter(LazyInterpreter::ready(Arc::new(interpreter)));
        bridge.install();

        let outcome = bridge.handle(UiEvent::Action(
            json!({"type": "Action", "params": {"name": "sparkle", "speed": 2}}),
        ));
        assert_eq!(outcome, BridgeOutcome::Delegated);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn legacy_descriptor_drops_name_from_params() {
        let descriptor =
            legacy_descriptor(&json!({"type": "Action", "params": {"name": "sparkle", "speed": 2}}))
                .unwrap();
        assert_eq!(descriptor.name, "sparkle");
        assert_eq!(Value::Object(descriptor.params), json!({"speed": 2}));
        assert!(legacy_descriptor(&json!({"type": "Mystery"})).is_none());
    }
}
