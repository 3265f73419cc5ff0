//! Pure full-replay state derivation.

pub mod names;
mod reducer;
mod state;

pub use reducer::{LogReducer, Reducer};
pub use state::{DerivedState, DEFAULT_JOURNAL_TRACK};

use crate::log::StateEvent;

/// Replay `log` from empty and return the resulting state.
///
/// No I/O, no clock, no randomness: the same log always derives the same
/// state, and `raw_count` always equals `log.len()`.
pub fn derive(log: &[StateEvent]) -> DerivedState {
    LogReducer::replay(log)
}
