// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-fake event subscriptions.

use rustc_hash::FxHashMap;

use crate::error::FakeError;
use crate::method::EventId;
use crate::value::{EventHandler, Value};

/// Subscribed handlers of one fake, keyed by event.
///
/// A handler list behaves like a multicast delegate: adding appends (the same
/// handler may appear more than once), removing drops the last equal
/// occurrence, and raising invokes every handler in subscription order.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    handlers: FxHashMap<EventId, Vec<EventHandler>>,
}

impl EventRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list of `event`.
    pub fn add(&mut self, event: EventId, handler: EventHandler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    /// Removes the last occurrence of `handler` from `event`.
    ///
    /// Returns `false` when the handler was not subscribed.
    pub fn remove(&mut self, event: EventId, handler: &EventHandler) -> bool {
        let Some(list) = self.handlers.get_mut(&event) else {
            return false;
        };
        let Some(pos) = list.iter().rposition(|h| h == handler) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.handlers.remove(&event);
        }
        true
    }

    /// Copy of the handlers subscribed to `event`, in subscription order.
    pub fn handlers(&self, event: EventId) -> Vec<EventHandler> {
        self.handlers.get(&event).cloned().unwrap_or_default()
    }

    /// Number of events with at least one handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no event has a handler.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Invokes `handlers` in order, stopping at the first error.
///
/// # Errors
/// Returns the first handler error unchanged.
pub(crate) fn invoke_all(handlers: &[EventHandler], arguments: &[Value]) -> Result<(), FakeError> {
    handlers.iter().try_for_each(|h| h.invoke(arguments))
}
