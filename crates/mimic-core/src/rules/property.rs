// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property-value memory shared by a getter and its setter.

use std::sync::{Arc, Mutex, PoisonError};

use crate::call::InterceptedCall;
use crate::error::FakeError;
use crate::method::{MethodKind, PropertyId};
use crate::rule::CallRule;
use crate::value::Value;

/// Remembers the value of one property: the setter stores, the getter returns.
#[derive(Debug)]
pub struct PropertyBehaviorRule {
    property: PropertyId,
    value: Mutex<Value>,
}

impl PropertyBehaviorRule {
    /// A rule for `property` currently holding `value`.
    pub fn new(property: PropertyId, value: Value) -> Self {
        Self {
            property,
            value: Mutex::new(value),
        }
    }

    /// The property this rule serves.
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// The stored value.
    pub fn value(&self) -> Value {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CallRule for PropertyBehaviorRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> bool {
        call.method().kind().property() == Some(self.property)
    }

    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        match call.method().kind() {
            MethodKind::PropertySetter(_) => {
                if let Some(assigned) = call.arguments().last() {
                    *value = assigned.clone();
                }
                call.set_return_value(Value::Unit);
            }
            _ => call.set_return_value(value.clone()),
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("property behavior {:?}", self.property)
    }

    fn snapshot(&self) -> Option<Arc<dyn CallRule>> {
        Some(Arc::new(Self::new(self.property, self.value())))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::method::MethodInfo;
    use crate::value::TypeTag;

    #[test]
    fn setter_value_is_returned_by_getter() {
        let get = MethodInfo::getter("IUser", "Name", TypeTag::Str);
        let set = MethodInfo::setter("IUser", "Name", TypeTag::Str);
        let property = get.kind().property().unwrap();
        let rule = PropertyBehaviorRule::new(property, Value::str(""));

        let mut write = InterceptedCall::new(Arc::clone(&set), vec![Value::str("ada")]);
        assert!(rule.is_applicable_to(&write));
        rule.apply(&mut write).unwrap();

        let mut read = InterceptedCall::new(get, Vec::new());
        rule.apply(&mut read).unwrap();
        assert_eq!(read.return_value(), Some(&Value::str("ada")));
    }

    #[test]
    fn ignores_other_properties() {
        let get = MethodInfo::getter("IUser", "Name", TypeTag::Str);
        let other = MethodInfo::getter("IUser", "Age", TypeTag::Int);
        let rule = PropertyBehaviorRule::new(get.kind().property().unwrap(), Value::Null);
        assert!(!rule.is_applicable_to(&InterceptedCall::new(other, Vec::new())));
    }

    #[test]
    fn snapshot_is_independent() {
        let get = MethodInfo::getter("IUser", "Name", TypeTag::Str);
        let set = MethodInfo::setter("IUser", "Name", TypeTag::Str);
        let rule = PropertyBehaviorRule::new(get.kind().property().unwrap(), Value::str("a"));
        let copy = rule.snapshot().unwrap();
        rule.apply(&mut InterceptedCall::new(set, vec![Value::str("b")]))
            .unwrap();
        let mut read = InterceptedCall::new(get, Vec::new());
        copy.apply(&mut read).unwrap();
        assert_eq!(read.return_value(), Some(&Value::str("a")));
    }
}
