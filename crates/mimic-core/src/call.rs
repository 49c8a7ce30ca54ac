// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-flight calls handed to the engine by the interception point.

use std::sync::Arc;

use crate::error::FakeError;
use crate::method::MethodInfo;
use crate::value::{ObjectRef, Value};

/// Positional call arguments, including out/ref slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentList {
    values: Vec<Value>,
}

impl ArgumentList {
    /// Wraps the given positional values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// An empty argument list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Overwrites the argument at `index`. Returns `false` if out of range.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Last argument (the assigned value of a property setter).
    pub fn last(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Iterates the arguments in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Arguments as a slice.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for ArgumentList {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl<'a> IntoIterator for &'a ArgumentList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Something that can actually execute a faked member: a wrapped real object
/// or the faked type's base implementation.
pub trait CallTarget: Send + Sync {
    /// Executes `method`, writing out/ref slots into `arguments` and returning
    /// the return value.
    fn invoke(&self, method: &MethodInfo, arguments: &mut ArgumentList) -> Result<Value, FakeError>;
}

/// A live, mutable call owned by the interception point.
///
/// The engine reads the method and arguments, and rules write the return value
/// and out/ref slots. Once [`crate::FakeManager::process`] returns, the
/// interception point copies the results back to the native caller.
pub struct InterceptedCall {
    method: Arc<MethodInfo>,
    arguments: ArgumentList,
    return_value: Option<Value>,
    target: Option<ObjectRef>,
    base: Option<Arc<dyn CallTarget>>,
}

impl InterceptedCall {
    /// A call to `method` with the given arguments.
    pub fn new(method: Arc<MethodInfo>, arguments: impl Into<ArgumentList>) -> Self {
        Self {
            method,
            arguments: arguments.into(),
            return_value: None,
            target: None,
            base: None,
        }
    }

    /// Attaches the faked instance the call was made on.
    pub fn with_target(mut self, target: ObjectRef) -> Self {
        self.target = Some(target);
        self
    }

    /// Attaches the base implementation used by "call base method" behaviors.
    pub fn with_base(mut self, base: Arc<dyn CallTarget>) -> Self {
        self.base = Some(base);
        self
    }

    /// The member being called.
    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    /// The faked instance, if the interception point supplied it.
    pub fn target(&self) -> Option<&ObjectRef> {
        self.target.as_ref()
    }

    /// Current argument values.
    pub fn arguments(&self) -> &ArgumentList {
        &self.arguments
    }

    /// Writes an argument slot; used for out/ref parameters.
    pub fn set_argument(&mut self, index: usize, value: Value) -> bool {
        self.arguments.set(index, value)
    }

    /// The return value set so far.
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    /// Sets the return value.
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = Some(value);
    }

    /// Takes the return value, leaving the slot empty.
    pub fn take_return_value(&mut self) -> Option<Value> {
        self.return_value.take()
    }

    /// Whether a base implementation is available.
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Runs the base implementation and stores its return value.
    pub fn call_base_method(&mut self) -> Result<(), FakeError> {
        let Some(base) = self.base.clone() else {
            return Err(FakeError::NoBaseImplementation {
                method: self.method.to_string(),
            });
        };
        let value = base.invoke(&self.method, &mut self.arguments)?;
        self.return_value = Some(value);
        Ok(())
    }
}

impl std::fmt::Debug for InterceptedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptedCall")
            .field("method", &self.method.to_string())
            .field("arguments", &self.arguments)
            .field("return_value", &self.return_value)
            .field("has_base", &self.base.is_some())
            .finish_non_exhaustive()
    }
}
