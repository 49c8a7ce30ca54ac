// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Point-in-time copies of a fake's mutable state.

use std::fmt;
use std::sync::Arc;

use crate::events::EventRegistry;
use crate::listener::InterceptionListener;
use crate::record::CompletedCall;
use crate::rule::{CallRule, RuleEntry};
use crate::sequence::SequenceNumber;

#[derive(Clone)]
struct RuleSnapshot {
    rule: Arc<dyn CallRule>,
    max_times: Option<u32>,
}

impl RuleSnapshot {
    fn of(entry: &RuleEntry) -> Self {
        Self {
            rule: detach(entry.rule()),
            max_times: entry.max_times(),
        }
    }
}

/// Copy of a rule with interior state, or the shared rule when it has none.
fn detach(rule: &Arc<dyn CallRule>) -> Arc<dyn CallRule> {
    rule.snapshot().unwrap_or_else(|| Arc::clone(rule))
}

/// Captured baseline of one fake.
///
/// Both directions copy: capturing detaches from the live chain, and every
/// restore hands out fresh entries (zeroed counters) over fresh copies of
/// stateful rules, so the baseline itself never changes.
#[derive(Clone)]
pub(crate) struct ManagerSnapshot {
    rules: Vec<RuleSnapshot>,
    events: EventRegistry,
    listeners: Vec<Arc<dyn InterceptionListener>>,
    calls: Vec<Arc<CompletedCall>>,
    last_sequence: Option<SequenceNumber>,
}

/// State handed back to the manager by [`ManagerSnapshot::materialize`].
pub(crate) struct RestoredState {
    pub(crate) rules: Vec<Arc<RuleEntry>>,
    pub(crate) events: EventRegistry,
    pub(crate) listeners: Vec<Arc<dyn InterceptionListener>>,
    pub(crate) calls: Vec<Arc<CompletedCall>>,
    pub(crate) last_sequence: Option<SequenceNumber>,
}

impl ManagerSnapshot {
    pub(crate) fn capture(
        rules: &[Arc<RuleEntry>],
        events: &EventRegistry,
        listeners: &[Arc<dyn InterceptionListener>],
        calls: Vec<Arc<CompletedCall>>,
        last_sequence: Option<SequenceNumber>,
    ) -> Self {
        Self {
            rules: rules.iter().map(|entry| RuleSnapshot::of(entry)).collect(),
            events: events.clone(),
            listeners: listeners.to_vec(),
            calls,
            last_sequence,
        }
    }

    pub(crate) fn materialize(&self) -> RestoredState {
        RestoredState {
            rules: self
                .rules
                .iter()
                .map(|r| Arc::new(RuleEntry::with_count(detach(&r.rule), 0, r.max_times)))
                .collect(),
            events: self.events.clone(),
            listeners: self.listeners.clone(),
            calls: self.calls.clone(),
            last_sequence: self.last_sequence,
        }
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl fmt::Debug for ManagerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerSnapshot")
            .field("rules", &self.rules.len())
            .field("events", &self.events.len())
            .field("listeners", &self.listeners.len())
            .field("calls", &self.calls.len())
            .field("last_sequence", &self.last_sequence)
            .finish()
    }
}
