// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rule primitives: the open rule trait and the counted chain entry.
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::call::InterceptedCall;
use crate::error::FakeError;

/// A unit of behavior that can claim and handle a call.
///
/// This is the extension point for rule authors. The engine's own fallback
/// behaviors are a closed enum ([`crate::BuiltInRule`]) and do not go through
/// this trait.
pub trait CallRule: Send + Sync {
    /// Whether this rule wants to handle `call`.
    ///
    /// Called while the fake's chain lock is held; must not call back into
    /// the same fake.
    fn is_applicable_to(&self, call: &InterceptedCall) -> bool;

    /// Handles `call`: set the return value, write out/ref slots, or fail.
    ///
    /// Runs outside the chain lock. Errors propagate unchanged to the code
    /// that made the faked call.
    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError>;

    /// How many times the rule may be selected before it expires.
    ///
    /// Read once, when the rule is inserted into a chain.
    fn number_of_times_to_call(&self) -> Option<u32> {
        None
    }

    /// Short human-readable description for logs and diagnostics.
    fn describe(&self) -> String {
        String::from("custom rule")
    }

    /// An independent copy of this rule, for rules with interior state.
    ///
    /// Snapshots call this on capture and on restore so live mutations never
    /// leak into a baseline. Stateless rules return `None` and are shared.
    fn snapshot(&self) -> Option<Arc<dyn CallRule>> {
        None
    }
}

/// A rule in a fake's chain together with its use counter.
///
/// Invariant: `times_called <= max_times` whenever `max_times` is set. An
/// exhausted entry stays in the chain (visible to inspection and removal) but
/// is skipped during matching.
pub struct RuleEntry {
    rule: Arc<dyn CallRule>,
    times_called: AtomicU32,
    max_times: Option<u32>,
}

impl RuleEntry {
    pub(crate) fn new(rule: Arc<dyn CallRule>) -> Self {
        let max_times = rule.number_of_times_to_call();
        Self::with_count(rule, 0, max_times)
    }

    pub(crate) fn with_count(rule: Arc<dyn CallRule>, times_called: u32, max_times: Option<u32>) -> Self {
        Self {
            rule,
            times_called: AtomicU32::new(times_called),
            max_times,
        }
    }

    /// The wrapped rule.
    pub fn rule(&self) -> &Arc<dyn CallRule> {
        &self.rule
    }

    /// How many times the entry has been selected.
    pub fn times_called(&self) -> u32 {
        self.times_called.load(Ordering::Acquire)
    }

    /// Selection limit, if any.
    pub fn max_times(&self) -> Option<u32> {
        self.max_times
    }

    /// Whether the selection limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.max_times.is_some_and(|max| self.times_called() >= max)
    }

    /// Counts one selection. Only called with the owning chain's lock held.
    pub(crate) fn record_use(&self) {
        self.times_called.fetch_add(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("rule", &self.rule.describe())
            .field("times_called", &self.times_called())
            .field("max_times", &self.max_times)
            .finish()
    }
}

/// Handle to an entry in a fake's chain, compared by identity.
///
/// Returned by the `add_rule_*` family and accepted by
/// [`crate::FakeManager::add_rule_after`] and
/// [`crate::FakeManager::remove_rule`].
#[derive(Clone)]
pub struct RuleHandle(pub(crate) Arc<RuleEntry>);

impl RuleHandle {
    /// The wrapped rule.
    pub fn rule(&self) -> &Arc<dyn CallRule> {
        self.0.rule()
    }

    /// How many times the entry has been selected.
    pub fn times_called(&self) -> u32 {
        self.0.times_called()
    }

    /// Selection limit, if any.
    pub fn max_times(&self) -> Option<u32> {
        self.0.max_times()
    }

    /// Whether the selection limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.0.is_exhausted()
    }

    /// Whether this handle refers to `entry`.
    pub(crate) fn refers_to(&self, entry: &Arc<RuleEntry>) -> bool {
        Arc::ptr_eq(&self.0, entry)
    }
}

impl PartialEq for RuleHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RuleHandle {}

impl fmt::Debug for RuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuleHandle").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Limited(Option<u32>);

    impl CallRule for Limited {
        fn is_applicable_to(&self, _: &InterceptedCall) -> bool {
            true
        }

        fn apply(&self, _: &mut InterceptedCall) -> Result<(), FakeError> {
            Ok(())
        }

        fn number_of_times_to_call(&self) -> Option<u32> {
            self.0
        }
    }

    #[test]
    fn entry_reads_limit_from_rule() {
        let entry = RuleEntry::new(Arc::new(Limited(Some(2))));
        assert_eq!(entry.max_times(), Some(2));
        assert!(!entry.is_exhausted());
        entry.record_use();
        assert!(!entry.is_exhausted());
        entry.record_use();
        assert!(entry.is_exhausted());
        assert_eq!(entry.times_called(), 2);
    }

    #[test]
    fn unlimited_entry_never_exhausts() {
        let entry = RuleEntry::new(Arc::new(Limited(None)));
        for _ in 0..100 {
            entry.record_use();
        }
        assert!(!entry.is_exhausted());
    }

    #[test]
    fn handles_compare_by_entry_identity() {
        let rule: Arc<dyn CallRule> = Arc::new(Limited(None));
        let a = RuleHandle(Arc::new(RuleEntry::new(Arc::clone(&rule))));
        let b = RuleHandle(Arc::new(RuleEntry::new(rule)));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
