// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Call-count assertions and repeat constraints.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::FakeError;
use crate::format::CallFormatter;
use crate::manager::FakeManager;
use crate::record::CompletedCall;
use crate::rules::CallMatcher;
use crate::scope::ScopeStack;

type CountPredicate = Arc<dyn Fn(usize) -> bool + Send + Sync>;

/// How many matching calls an assertion expects.
#[derive(Clone)]
pub enum Repeated {
    /// No matching call.
    Never,
    /// Exactly `n` matching calls.
    Exactly(usize),
    /// At least `n` matching calls.
    AtLeast(usize),
    /// At most `n` matching calls.
    AtMost(usize),
    /// A count accepted by the predicate.
    Matching {
        /// Predicate over the count.
        predicate: CountPredicate,
        /// Text shown in diagnostics.
        description: String,
    },
}

impl Repeated {
    /// Exactly one call.
    pub fn once() -> Self {
        Self::Exactly(1)
    }

    /// Exactly two calls.
    pub fn twice() -> Self {
        Self::Exactly(2)
    }

    /// A count accepted by `predicate`.
    pub fn matching<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        Self::Matching {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    /// Whether `count` matching calls satisfy the constraint.
    pub fn is_satisfied_by(&self, count: usize) -> bool {
        match self {
            Self::Never => count == 0,
            Self::Exactly(n) => count == *n,
            Self::AtLeast(n) => count >= *n,
            Self::AtMost(n) => count <= *n,
            Self::Matching { predicate, .. } => predicate(count),
        }
    }
}

fn times(n: usize) -> String {
    match n {
        1 => String::from("once"),
        2 => String::from("twice"),
        n => format!("{n} times"),
    }
}

impl fmt::Display for Repeated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Exactly(n) => write!(f, "exactly {}", times(*n)),
            Self::AtLeast(n) => write!(f, "at least {}", times(*n)),
            Self::AtMost(n) => write!(f, "at most {}", times(*n)),
            Self::Matching { description, .. } => f.write_str(description),
        }
    }
}

impl fmt::Debug for Repeated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Repeated({self})")
    }
}

/// Appends a numbered listing of `calls` to `out`.
pub(crate) fn write_call_listing(out: &mut String, formatter: &dyn CallFormatter, calls: &[Arc<CompletedCall>]) {
    if calls.is_empty() {
        out.push_str("    no calls\n");
        return;
    }
    for (i, call) in calls.iter().enumerate() {
        let _ = writeln!(out, "    {}: {}", i + 1, formatter.describe_record(call));
    }
}

/// Verifies how often calls happened on one fake.
///
/// Only calls visible from the innermost open scope count, and only those
/// recorded before the assertion started: calls made while evaluating a
/// predicate are ordered after the snapshot point and ignored.
pub struct CallAsserter {
    scopes: Arc<ScopeStack>,
    formatter: Arc<dyn CallFormatter>,
}

impl CallAsserter {
    pub(crate) fn new(scopes: Arc<ScopeStack>, formatter: Arc<dyn CallFormatter>) -> Self {
        Self { scopes, formatter }
    }

    /// Asserts that calls matching `predicate` happened `repeated` times.
    ///
    /// # Errors
    /// Returns [`FakeError::ExpectationFailed`] listing every visible call
    /// when the count does not satisfy `repeated`.
    pub fn must_have_happened<P>(
        &self,
        manager: &FakeManager,
        predicate: P,
        description: &str,
        repeated: &Repeated,
    ) -> Result<(), FakeError>
    where
        P: Fn(&CompletedCall) -> bool,
    {
        let Some(last) = manager.last_sequence_number() else {
            return self.check(manager, &[], 0, description, repeated);
        };
        let visible: Vec<Arc<CompletedCall>> = self
            .scopes
            .current()
            .calls_for(manager)
            .into_iter()
            .filter(|call| call.sequence_number() <= last)
            .collect();
        let matched = visible.iter().filter(|call| predicate(call)).count();
        self.check(manager, &visible, matched, description, repeated)
    }

    /// [`CallAsserter::must_have_happened`] with a [`CallMatcher`].
    ///
    /// # Errors
    /// See [`CallAsserter::must_have_happened`].
    pub fn must_have_happened_matching(
        &self,
        manager: &FakeManager,
        matcher: &CallMatcher,
        repeated: &Repeated,
    ) -> Result<(), FakeError> {
        self.must_have_happened(
            manager,
            |call| matcher.matches_record(call),
            &matcher.describe(),
            repeated,
        )
    }

    /// Asserts that no call matching `matcher` happened.
    ///
    /// # Errors
    /// See [`CallAsserter::must_have_happened`].
    pub fn must_not_have_happened(&self, manager: &FakeManager, matcher: &CallMatcher) -> Result<(), FakeError> {
        self.must_have_happened_matching(manager, matcher, &Repeated::Never)
    }

    fn check(
        &self,
        manager: &FakeManager,
        visible: &[Arc<CompletedCall>],
        matched: usize,
        description: &str,
        repeated: &Repeated,
    ) -> Result<(), FakeError> {
        if repeated.is_satisfied_by(matched) {
            return Ok(());
        }
        let mut message = format!(
            "\n  Assertion failed for the following call:\n    {}: {description}\n  \
             Expected to find it {repeated} but found it {} among the calls:\n",
            manager.display_name(),
            times(matched)
        );
        write_call_listing(&mut message, self.formatter.as_ref(), visible);
        Err(FakeError::ExpectationFailed(message))
    }
}

impl fmt::Debug for CallAsserter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallAsserter").finish_non_exhaustive()
    }
}
