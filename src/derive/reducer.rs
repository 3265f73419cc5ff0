use serde_json::Value;

use crate::log::StateEvent;

use super::names;
use super::state::{DerivedState, DEFAULT_JOURNAL_TRACK};

/// Pure fold from (State, &Event) to State.
///
/// The reducer is the only place where state transitions happen; state is
/// always rebuilt by replaying events from `State::default()`.
pub trait Reducer {
    type State: Clone + PartialEq + Default;
    type Event;

    fn reduce(state: Self::State, event: &Self::Event) -> Self::State;

    /// Replay a whole sequence of events starting from `State::default()`.
    fn replay<'a, I>(events: I) -> Self::State
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events
            .into_iter()
            .fold(Self::State::default(), |state, event| Self::reduce(state, event))
    }
}

/// Folds one logged event into [`DerivedState`].
///
/// Events that lack what a rule needs (a string `key`, a view name) are
/// skipped, never rejected; every event still bumps `raw_count`.
pub struct LogReducer;

impl Reducer for LogReducer {
    type State = DerivedState;
    type Event = StateEvent;

    fn reduce(mut state: Self::State, event: &Self::Event) -> Self::State {
        state.raw_count += 1;

        match event.intent.as_str() {
            names::CURRENT_VIEW => {
                if let Some(view) = view_of(event) {
                    state.current_view = Some(view.to_string());
                }
            }
            names::JOURNAL_SET | names::JOURNAL_ADD => {
                if let Some(key) = event.str_field("key") {
                    let track = event
                        .str_field("track")
                        .unwrap_or(DEFAULT_JOURNAL_TRACK)
                        .to_string();
                    state
                        .journal
                        .entry(track)
                        .or_default()
                        .insert(key.to_string(), value_of(event));
                }
            }
            names::STATE_UPDATE => {
                if let Some(key) = event.str_field("key") {
                    state.values.insert(key.to_string(), value_of(event));
                }
            }
            names::SCAN_RESULT | names::SCAN_INTERPRETED => {
                state.scans.push(payload_of(event));
            }
            names::INTERACTION_RECORD => {
                state.interactions.push(payload_of(event));
            }
            _ => {}
        }

        state
    }
}

fn value_of(event: &StateEvent) -> Value {
    event.field("value").cloned().unwrap_or(Value::Null)
}

fn payload_of(event: &StateEvent) -> Value {
    event.payload.clone().unwrap_or(Value::Null)
}

fn view_of(event: &StateEvent) -> Option<&str> {
    if let Some(Value::String(view)) = &event.payload {
        return Some(view.as_str());
    }
    ["view", "currentView", "value", "screenId"]
        .iter()
        .find_map(|field| event.str_field(field))
}
