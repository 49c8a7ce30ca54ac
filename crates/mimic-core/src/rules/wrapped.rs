// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Forwarding to a wrapped real object.

use std::sync::Arc;

use crate::call::{CallTarget, InterceptedCall};
use crate::error::FakeError;
use crate::rule::CallRule;

/// Forwards every call to a real object, copying back out/ref writes and the
/// return value.
pub struct WrappedObjectRule {
    target: Arc<dyn CallTarget>,
}

impl WrappedObjectRule {
    /// Forwards to `target`.
    pub fn new(target: Arc<dyn CallTarget>) -> Self {
        Self { target }
    }
}

impl CallRule for WrappedObjectRule {
    fn is_applicable_to(&self, _call: &InterceptedCall) -> bool {
        true
    }

    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        let method = Arc::clone(call.method());
        let mut arguments = call.arguments().clone();
        let value = self.target.invoke(&method, &mut arguments)?;
        for (index, param) in method.params().iter().enumerate() {
            if param.mode.is_by_ref() {
                if let Some(written) = arguments.get(index) {
                    call.set_argument(index, written.clone());
                }
            }
        }
        call.set_return_value(value);
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("forward to wrapped object")
    }
}

impl std::fmt::Debug for WrappedObjectRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedObjectRule").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::call::ArgumentList;
    use crate::method::MethodInfo;
    use crate::value::{TypeTag, Value};

    struct Scribbler;

    impl CallTarget for Scribbler {
        fn invoke(&self, _: &MethodInfo, arguments: &mut ArgumentList) -> Result<Value, FakeError> {
            arguments.set(0, Value::Int(-1));
            arguments.set(1, Value::Int(99));
            Ok(Value::str("done"))
        }
    }

    #[test]
    fn copies_back_only_by_ref_slots() {
        let method = MethodInfo::builder("IStore", "Load")
            .param("key", TypeTag::Int)
            .ref_param("cursor", TypeTag::Int)
            .returns(TypeTag::Str)
            .build();
        let rule = WrappedObjectRule::new(Arc::new(Scribbler));
        let mut call = InterceptedCall::new(method, vec![Value::Int(5), Value::Int(0)]);
        rule.apply(&mut call).unwrap();
        assert_eq!(call.arguments().as_slice(), &[Value::Int(5), Value::Int(99)]);
        assert_eq!(call.return_value(), Some(&Value::str("done")));
    }
}
