//! Event-sourced state runtime for JSON-described screens.
//!
//! UI events flow through a single dispatch bridge, get normalized into a
//! closed set of behavior intents, and either land in an append-only event
//! log (from which state is re-derived by full replay), trigger navigation,
//! or are handed off to an external executor.

pub mod bridge;
pub mod config;
pub mod derive;
pub mod diagnostics;
pub mod hub;
pub mod intent;
pub mod log;
pub mod logging;
pub mod runtime;

pub use bridge::{BridgeOutcome, DispatchBridge, UiEvent};
pub use derive::{derive, DerivedState};
pub use intent::{normalize_behavior_payload, normalize_navigate_detail, BehaviorIntent, NormalizeResult};
pub use log::{EventLog, StateEvent};
pub use runtime::{DispatchOutcome, Runtime};
