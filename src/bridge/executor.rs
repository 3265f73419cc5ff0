//! Handoff contracts for behavior the runtime does not implement itself.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use thiserror::Error;

use crate::derive::DerivedState;
use crate::intent::Args;

/// Injected navigation callback.
pub type Navigator = Arc<dyn Fn(&str) + Send + Sync>;

/// Errors reported by external executors. Logged by the bridge, never raised
/// to the UI.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Unsupported action '{action}' in domain '{domain}'")]
    Unsupported { domain: String, action: String },

    #[error("Action '{action}' failed: {message}")]
    Failed { action: String, message: String },
}

/// Handlers and state made available to contract executors.
#[derive(Clone)]
pub struct NavigationContext {
    navigator: Option<Navigator>,
    state: Arc<DerivedState>,
}

impl NavigationContext {
    pub fn new(navigator: Option<Navigator>, state: Arc<DerivedState>) -> Self {
        Self { navigator, state }
    }

    /// Navigate through the host callback. Returns false when none is wired.
    pub fn navigate(&self, to: &str) -> bool {
        match &self.navigator {
            Some(navigator) => {
                navigator(to);
                true
            }
            None => false,
        }
    }

    /// Derived state at the time the action was handed off.
    pub fn state(&self) -> &DerivedState {
        &self.state
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("navigator", &self.navigator.is_some())
            .field("raw_count", &self.state.raw_count)
            .finish()
    }
}

/// Runs contract verbs (`crop`, `filter`, ...) for a domain.
pub trait ContractExecutor: Send + Sync {
    fn execute(
        &self,
        domain: &str,
        action: &str,
        context: &NavigationContext,
        params: &Args,
    ) -> Result<(), ExecutorError>;
}

/// `{name, ...params}` as handed to the runtime-verb interpreter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub params: Args,
}

/// Interprets action names outside the behavior contract.
pub trait RuntimeInterpreter: Send + Sync {
    fn interpret(&self, action: &ActionDescriptor, state: &DerivedState) -> Result<(), ExecutorError>;
}

type InterpreterResolver = Box<dyn Fn() -> Option<Arc<dyn RuntimeInterpreter>> + Send + Sync>;

/// Runtime-verb interpreter resolved on first use.
///
/// The resolver runs at most once; a `None` answer is remembered too.
pub struct LazyInterpreter {
    resolver: InterpreterResolver,
    cell: OnceLock<Option<Arc<dyn RuntimeInterpreter>>>,
}

impl LazyInterpreter {
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn RuntimeInterpreter>> + Send + Sync + 'static,
    {
        Self {
            resolver: Box::new(resolver),
            cell: OnceLock::new(),
        }
    }

    /// Already-constructed interpreter.
    pub fn ready(interpreter: Arc<dyn RuntimeInterpreter>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Some(interpreter));
        Self {
            resolver: Box::new(|| None::<Arc<dyn RuntimeInterpreter>>),
            cell,
        }
    }

    pub fn get(&self) -> Option<&Arc<dyn RuntimeInterpreter>> {
        self.cell
            .get_or_init(|| {
                let resolved = (self.resolver)();
                tracing::debug!(resolved = resolved.is_some(), "Runtime interpreter resolved");
                resolved
            })
            .as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}
