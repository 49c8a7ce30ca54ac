// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted rules for tests.
//!
//! A [`ScriptedRule`] counts its applications and does one scripted thing:
//! return a value, fail, or panic. The builder mirrors the knobs the engine
//! reads from a rule (applicability, repeat limit, snapshot support).

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use mimic_core::{CallRule, FakeError, InterceptedCall, MethodId, MethodInfo, Value};

type Predicate = Arc<dyn Fn(&InterceptedCall) -> bool + Send + Sync>;

#[derive(Clone)]
enum Script {
    Return(Value),
    Fail(FakeError),
    Panic(&'static str),
}

/// Rule with a scripted outcome and an application counter.
pub struct ScriptedRule {
    name: String,
    predicate: Predicate,
    script: Script,
    max_times: Option<u32>,
    stateful: bool,
    applied: AtomicU32,
}

impl ScriptedRule {
    /// How many times `apply` ran.
    pub fn applied(&self) -> u32 {
        self.applied.load(Ordering::Acquire)
    }

    /// The name given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CallRule for ScriptedRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> bool {
        (self.predicate)(call)
    }

    #[allow(clippy::panic)]
    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        self.applied.fetch_add(1, Ordering::AcqRel);
        match &self.script {
            Script::Return(value) => {
                call.set_return_value(value.clone());
                Ok(())
            }
            Script::Fail(error) => Err(error.clone()),
            Script::Panic(message) => panic!("{message}"),
        }
    }

    fn number_of_times_to_call(&self) -> Option<u32> {
        self.max_times
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn snapshot(&self) -> Option<Arc<dyn CallRule>> {
        if !self.stateful {
            return None;
        }
        Some(Arc::new(Self {
            name: self.name.clone(),
            predicate: Arc::clone(&self.predicate),
            script: self.script.clone(),
            max_times: self.max_times,
            stateful: true,
            applied: AtomicU32::new(self.applied()),
        }))
    }
}

impl fmt::Debug for ScriptedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRule")
            .field("name", &self.name)
            .field("max_times", &self.max_times)
            .field("applied", &self.applied())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ScriptedRule`].
///
/// # Example
///
/// ```
/// use mimic_dry_tests::{Calculator, ScriptedRuleBuilder};
/// use mimic_core::Value;
///
/// let rule = ScriptedRuleBuilder::new("add returns 3")
///     .for_method(&Calculator::add())
///     .returns(Value::Int(3))
///     .times(2)
///     .build();
/// assert_eq!(rule.applied(), 0);
/// ```
pub struct ScriptedRuleBuilder {
    name: String,
    predicate: Predicate,
    script: Script,
    max_times: Option<u32>,
    stateful: bool,
}

impl ScriptedRuleBuilder {
    /// A rule named `name` that applies to every call and returns unit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(|_| true),
            script: Script::Return(Value::Unit),
            max_times: None,
            stateful: false,
        }
    }

    /// Applies when `predicate` holds.
    pub fn applies_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&InterceptedCall) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Applies to calls of `method` only.
    pub fn for_method(self, method: &MethodInfo) -> Self {
        let id: MethodId = method.id();
        self.applies_when(move |call| call.method().id() == id)
    }

    /// Never applies.
    pub fn never_applies(self) -> Self {
        self.applies_when(|_| false)
    }

    /// Returns `value`.
    pub fn returns(mut self, value: Value) -> Self {
        self.script = Script::Return(value);
        self
    }

    /// Fails with `error`.
    pub fn fails_with(mut self, error: FakeError) -> Self {
        self.script = Script::Fail(error);
        self
    }

    /// Panics with `message`.
    pub fn panics_with(mut self, message: &'static str) -> Self {
        self.script = Script::Panic(message);
        self
    }

    /// Expires after `n` applications.
    pub fn times(mut self, n: u32) -> Self {
        self.max_times = Some(n);
        self
    }

    /// Reports interior state, so snapshots copy the rule instead of sharing it.
    pub fn stateful(mut self) -> Self {
        self.stateful = true;
        self
    }

    /// Builds the rule.
    pub fn build(self) -> Arc<ScriptedRule> {
        Arc::new(ScriptedRule {
            name: self.name,
            predicate: self.predicate,
            script: self.script,
            max_times: self.max_times,
            stateful: self.stateful,
            applied: AtomicU32::new(0),
        })
    }
}

impl fmt::Debug for ScriptedRuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRuleBuilder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
