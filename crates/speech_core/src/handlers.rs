use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use crate::SubscriptionId;

/// Called with `true` when speech starts and `false` when it stops.
pub type StateCallback = Rc<dyn Fn(bool)>;

/// Handler table for state-change callbacks, keyed by [`SubscriptionId`].
///
/// Used on both sides of the boundary: by the controller for its subscribers,
/// and by the host adapter for its listeners.
#[derive(Default)]
pub struct StateHandlers {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, StateCallback)>,
}

impl StateHandlers {
    pub fn insert(&mut self, callback: StateCallback) -> SubscriptionId {
        let id = self.next_id;
        self.next_id = id.next();
        self.entries.push((id, callback));
        id
    }

    /// Returns `false` if there was no such subscription.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let len_before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != len_before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The callbacks to invoke, in subscription order.
    ///
    /// Taken as a snapshot so callbacks are free to (un)subscribe while being notified.
    pub fn snapshot(&self) -> Vec<StateCallback> {
        self.entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }
}

/// Invoke every callback with `speaking`.
///
/// A panicking callback is logged and skipped; the rest are still notified.
pub fn notify_all(callbacks: &[StateCallback], speaking: bool) {
    for callback in callbacks {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(speaking))) {
            log::error!(
                "State-change callback panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
