//! Behavior intent normalization.
//!
//! UI layers describe effects in several historical shapes (`{type: "Action",
//! params: {name: "state:journal.add"}}`, `{type: "Navigation", ...}`, bare
//! navigate details) alongside the canonical `{kind: ...}` form. Everything is
//! folded into [`BehaviorIntent`] here, before any state is touched. Both entry
//! points are total: malformed input becomes a [`LegacyIntent`] with warnings.

mod behavior;
mod navigate;
mod normalize;
mod payload;
pub mod vocab;

pub use behavior::{
    ActionIntent, Args, BehaviorIntent, InteractionIntent, LegacyIntent, MutationIntent,
    NavigationIntent, NormalizeResult,
};
pub use navigate::normalize_navigate_detail;
pub use normalize::normalize_behavior_payload;
pub use payload::RawBehavior;
pub use vocab::{InteractionVerb, MutationVerb, NavigationVerb};
