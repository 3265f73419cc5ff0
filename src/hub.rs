//! Observers notified after every successful derive.

use std::sync::Arc;

use crate::derive::DerivedState;

/// Callback receiving the freshly derived state.
pub type Listener = Arc<dyn Fn(&DerivedState) + Send + Sync>;

/// Handle returned by [`SubscriptionHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered listener registry. Notification order is registration order.
#[derive(Default)]
pub struct SubscriptionHub {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Current listeners, detached from the registry so callbacks may
    /// subscribe or unsubscribe while being notified.
    pub fn listeners(&self) -> Vec<Listener> {
        self.listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn notifies_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hub = SubscriptionHub::new();
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            hub.subscribe(Arc::new(move |_state: &DerivedState| seen.lock().push(tag)));
        }

        let state = DerivedState::default();
        for listener in hub.listeners() {
            listener(&state);
        }
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_removes_once() {
        let mut hub = SubscriptionHub::new();
        let id = hub.subscribe(Arc::new(|_: &DerivedState| {}));
        assert_eq!(hub.len(), 1);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert!(hub.is_empty());
    }
}
