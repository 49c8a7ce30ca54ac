// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-configured rules: matcher, side effects, outcome, repeat limit.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::call::InterceptedCall;
use crate::error::FakeError;
use crate::rule::CallRule;
use crate::rules::matcher::CallMatcher;
use crate::value::Value;

type SideEffect = Arc<dyn Fn(&InterceptedCall) -> Result<(), FakeError> + Send + Sync>;
type ValueFactory = Arc<dyn Fn(&InterceptedCall) -> Value + Send + Sync>;
type ErrorFactory = Arc<dyn Fn(&InterceptedCall) -> FakeError + Send + Sync>;
type ValuesFactory = Arc<dyn Fn(&InterceptedCall) -> Vec<Value> + Send + Sync>;

#[derive(Clone)]
enum Outcome {
    ZeroValue,
    Returns(Value),
    ReturnsLazily(ValueFactory),
    Throws(FakeError),
    ThrowsLazily(ErrorFactory),
    CallsBaseMethod,
}

#[derive(Clone)]
enum OutAndRef {
    Values(Vec<Value>),
    Lazily(ValuesFactory),
}

/// A rule built from a [`CallMatcher`] and a configured behavior.
///
/// Applying runs the side effects in registration order, then the outcome,
/// then writes out/ref slots (only when the outcome succeeded).
pub struct ConfiguredRule {
    matcher: CallMatcher,
    side_effects: Vec<SideEffect>,
    outcome: Outcome,
    out_and_ref: Option<OutAndRef>,
    max_times: Option<u32>,
    applied: AtomicU32,
}

impl ConfiguredRule {
    /// Starts configuring a rule for calls matching `matcher`.
    pub fn builder(matcher: CallMatcher) -> RuleBuilder {
        RuleBuilder {
            matcher,
            side_effects: Vec::new(),
            outcome: Outcome::ZeroValue,
            out_and_ref: None,
            max_times: None,
        }
    }

    /// The matcher deciding applicability.
    pub fn matcher(&self) -> &CallMatcher {
        &self.matcher
    }

    /// How many times the rule has been applied.
    pub fn times_applied(&self) -> u32 {
        self.applied.load(Ordering::Acquire)
    }

    /// Same configuration, applied count back at zero to match the fresh
    /// chain entry a restore creates for it.
    fn unused_copy(&self) -> Self {
        Self {
            matcher: self.matcher.clone(),
            side_effects: self.side_effects.clone(),
            outcome: self.outcome.clone(),
            out_and_ref: self.out_and_ref.clone(),
            max_times: self.max_times,
            applied: AtomicU32::new(0),
        }
    }

    fn assign_out_and_ref(&self, call: &mut InterceptedCall) {
        let values = match &self.out_and_ref {
            None => return,
            Some(OutAndRef::Values(values)) => values.clone(),
            Some(OutAndRef::Lazily(factory)) => factory(call),
        };
        let slots: Vec<usize> = call
            .method()
            .params()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.mode.is_by_ref())
            .map(|(i, _)| i)
            .collect();
        for (index, value) in slots.into_iter().zip(values) {
            call.set_argument(index, value);
        }
    }
}

impl CallRule for ConfiguredRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> bool {
        self.matcher.matches(call)
    }

    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        self.applied.fetch_add(1, Ordering::AcqRel);
        for effect in &self.side_effects {
            effect(call)?;
        }
        match &self.outcome {
            Outcome::ZeroValue => {
                let zero = call.method().return_type().zero_value();
                call.set_return_value(zero);
            }
            Outcome::Returns(value) => call.set_return_value(value.clone()),
            Outcome::ReturnsLazily(factory) => {
                let value = factory(call);
                call.set_return_value(value);
            }
            Outcome::Throws(error) => return Err(error.clone()),
            Outcome::ThrowsLazily(factory) => return Err(factory(call)),
            Outcome::CallsBaseMethod => call.call_base_method()?,
        }
        self.assign_out_and_ref(call);
        Ok(())
    }

    fn number_of_times_to_call(&self) -> Option<u32> {
        self.max_times
    }

    fn describe(&self) -> String {
        self.matcher.describe()
    }

    fn snapshot(&self) -> Option<Arc<dyn CallRule>> {
        Some(Arc::new(self.unused_copy()))
    }
}

impl fmt::Debug for ConfiguredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredRule")
            .field("matcher", &self.matcher)
            .field("side_effects", &self.side_effects.len())
            .field("max_times", &self.max_times)
            .field("applied", &self.times_applied())
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`ConfiguredRule`].
///
/// Each outcome setter replaces the previous one; side effects accumulate.
#[must_use]
pub struct RuleBuilder {
    matcher: CallMatcher,
    side_effects: Vec<SideEffect>,
    outcome: Outcome,
    out_and_ref: Option<OutAndRef>,
    max_times: Option<u32>,
}

impl RuleBuilder {
    /// Adds a side effect run before the outcome. An error aborts the call.
    pub fn invokes<F>(mut self, effect: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Result<(), FakeError> + Send + Sync + 'static,
    {
        self.side_effects.push(Arc::new(effect));
        self
    }

    /// Returns `value`.
    pub fn returns(mut self, value: impl Into<Value>) -> Self {
        self.outcome = Outcome::Returns(value.into());
        self
    }

    /// Returns a value computed from the call.
    pub fn returns_lazily<F>(mut self, factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Value + Send + Sync + 'static,
    {
        self.outcome = Outcome::ReturnsLazily(Arc::new(factory));
        self
    }

    /// Fails with `error`.
    pub fn throws(mut self, error: FakeError) -> Self {
        self.outcome = Outcome::Throws(error);
        self
    }

    /// Fails with an error computed from the call.
    pub fn throws_lazily<F>(mut self, factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> FakeError + Send + Sync + 'static,
    {
        self.outcome = Outcome::ThrowsLazily(Arc::new(factory));
        self
    }

    /// Delegates to the base implementation supplied with the call.
    pub fn calls_base_method(mut self) -> Self {
        self.outcome = Outcome::CallsBaseMethod;
        self
    }

    /// Returns the zero value of the return type (the default outcome).
    pub fn does_nothing(mut self) -> Self {
        self.outcome = Outcome::ZeroValue;
        self
    }

    /// Writes `values` to the out/ref parameters, in parameter order.
    pub fn assigns_out_and_ref(mut self, values: Vec<Value>) -> Self {
        self.out_and_ref = Some(OutAndRef::Values(values));
        self
    }

    /// Writes values computed from the call to the out/ref parameters.
    pub fn assigns_out_and_ref_lazily<F>(mut self, factory: F) -> Self
    where
        F: Fn(&InterceptedCall) -> Vec<Value> + Send + Sync + 'static,
    {
        self.out_and_ref = Some(OutAndRef::Lazily(Arc::new(factory)));
        self
    }

    /// Expires the rule after `n` applications.
    pub fn times(mut self, n: u32) -> Self {
        self.max_times = Some(n);
        self
    }

    /// Expires the rule after one application.
    pub fn once(self) -> Self {
        self.times(1)
    }

    /// Expires the rule after two applications.
    pub fn twice(self) -> Self {
        self.times(2)
    }

    /// Finishes the rule.
    pub fn build(self) -> Arc<ConfiguredRule> {
        Arc::new(ConfiguredRule {
            matcher: self.matcher,
            side_effects: self.side_effects,
            outcome: self.outcome,
            out_and_ref: self.out_and_ref,
            max_times: self.max_times,
            applied: AtomicU32::new(0),
        })
    }
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("matcher", &self.matcher)
            .field("max_times", &self.max_times)
            .finish_non_exhaustive()
    }
}
