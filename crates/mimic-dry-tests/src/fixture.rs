// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A context with one faked calculator.

use std::sync::Arc;

use mimic_core::{
    FakeContext, FakeError, FakeManager, FakeOptions, InterceptedCall, MethodInfo, ObjectRef, Value,
};

use crate::methods::Calculator;

/// Stand-in for the faked instance; only its identity matters.
#[derive(Debug, Default)]
pub struct CalculatorInstance;

/// A context, a faked calculator instance, and its manager.
#[derive(Debug)]
pub struct FakeFixture {
    /// The context that created the fake.
    pub context: FakeContext,
    /// The faked instance.
    pub object: Arc<CalculatorInstance>,
    /// The instance's manager.
    pub manager: Arc<FakeManager>,
}

impl FakeFixture {
    /// A loose calculator fake in a fresh default context.
    ///
    /// # Errors
    /// Propagates [`FakeContext::create_fake`] failures.
    pub fn new() -> Result<Self, FakeError> {
        Self::with_options(FakeContext::new(), FakeOptions::new())
    }

    /// A calculator fake created in `context` with `options`.
    ///
    /// # Errors
    /// Propagates [`FakeContext::create_fake`] failures.
    pub fn with_options(context: FakeContext, options: FakeOptions) -> Result<Self, FakeError> {
        let object = Arc::new(CalculatorInstance);
        let manager = context.create_fake(&object, Calculator::TYPE, options)?;
        Ok(Self {
            context,
            object,
            manager,
        })
    }

    /// Another calculator fake in the same context.
    ///
    /// # Errors
    /// Propagates [`FakeContext::create_fake`] failures.
    pub fn sibling(&self, options: FakeOptions) -> Result<Self, FakeError> {
        Self::with_options(self.context.clone(), options)
    }

    /// Processes a call to `method` with `arguments` on the fake.
    ///
    /// Returns the finished call so tests can inspect the return value and
    /// out/ref slots.
    ///
    /// # Errors
    /// Whatever the applied rule returned.
    pub fn call(&self, method: Arc<MethodInfo>, arguments: Vec<Value>) -> Result<InterceptedCall, FakeError> {
        let mut call = InterceptedCall::new(method, arguments)
            .with_target(ObjectRef::new(Arc::clone(&self.object)));
        self.manager.process(&mut call)?;
        Ok(call)
    }

    /// Processes a call and returns only its return value.
    ///
    /// # Errors
    /// Whatever the applied rule returned.
    pub fn call_value(&self, method: Arc<MethodInfo>, arguments: Vec<Value>) -> Result<Option<Value>, FakeError> {
        Ok(self.call(method, arguments)?.take_return_value())
    }
}
