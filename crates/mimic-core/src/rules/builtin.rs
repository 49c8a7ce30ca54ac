// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fallback behaviors used when no rule in a fake's chain claims a call.

use std::sync::Arc;

use crate::call::InterceptedCall;
use crate::error::FakeError;
use crate::events::invoke_all;
use crate::manager::FakeManager;
use crate::method::{MethodKind, ParamMode};
use crate::rules::property::PropertyBehaviorRule;
use crate::value::Value;

/// Built-in fallback rules, in priority order.
///
/// [`BuiltInRule::DefaultReturnValue`] applies to every call, so selection
/// over [`FALLBACK_ORDER`] always succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInRule {
    /// Event add/remove accessors: subscribe, unsubscribe, raise.
    EventHandling,
    /// `Equals`, `GetHashCode`, `ToString` with identity semantics.
    ObjectMembers,
    /// First read of an unconfigured property: remember a dummy value.
    AutoFakeProperty,
    /// Property write: remember the assigned value.
    PropertySetter,
    /// A call carrying an already-canceled token fails as canceled.
    Cancellation,
    /// Dummy (or zero) return value, dummy out parameters.
    DefaultReturnValue,
}

/// Fallback evaluation order.
pub const FALLBACK_ORDER: [BuiltInRule; 6] = [
    BuiltInRule::EventHandling,
    BuiltInRule::ObjectMembers,
    BuiltInRule::AutoFakeProperty,
    BuiltInRule::PropertySetter,
    BuiltInRule::Cancellation,
    BuiltInRule::DefaultReturnValue,
];

impl BuiltInRule {
    /// The first fallback that applies to `call`.
    pub fn select(call: &InterceptedCall) -> Self {
        FALLBACK_ORDER
            .into_iter()
            .find(|rule| rule.is_applicable_to(call))
            .unwrap_or(Self::DefaultReturnValue)
    }

    /// Whether this fallback handles `call`.
    pub fn is_applicable_to(self, call: &InterceptedCall) -> bool {
        let kind = call.method().kind();
        match self {
            Self::EventHandling => kind.event().is_some(),
            Self::ObjectMembers => kind.is_object_member(),
            Self::AutoFakeProperty => matches!(kind, MethodKind::PropertyGetter(_)),
            Self::PropertySetter => matches!(kind, MethodKind::PropertySetter(_)),
            Self::Cancellation => call
                .arguments()
                .iter()
                .any(|v| matches!(v, Value::Token(t) if t.is_cancellation_requested())),
            Self::DefaultReturnValue => true,
        }
    }

    /// Handles `call` on behalf of `manager`.
    ///
    /// # Errors
    /// Event raising returns the first handler error; cancellation returns
    /// [`FakeError::OperationCanceled`].
    pub fn apply(self, manager: &FakeManager, call: &mut InterceptedCall) -> Result<(), FakeError> {
        match self {
            Self::EventHandling => apply_event(manager, call),
            Self::ObjectMembers => {
                apply_object_member(manager, call);
                Ok(())
            }
            Self::AutoFakeProperty => {
                if let MethodKind::PropertyGetter(property) = call.method().kind() {
                    let value = manager.dummy_for(call.method().return_type());
                    manager.insert_untracked_first(Arc::new(PropertyBehaviorRule::new(
                        property,
                        value.clone(),
                    )));
                    call.set_return_value(value);
                }
                Ok(())
            }
            Self::PropertySetter => {
                if let MethodKind::PropertySetter(property) = call.method().kind() {
                    let value = call.arguments().last().cloned().unwrap_or(Value::Null);
                    manager.insert_untracked_first(Arc::new(PropertyBehaviorRule::new(property, value)));
                    call.set_return_value(Value::Unit);
                }
                Ok(())
            }
            Self::Cancellation => Err(FakeError::OperationCanceled {
                method: call.method().to_string(),
            }),
            Self::DefaultReturnValue => {
                let method = Arc::clone(call.method());
                for (index, param) in method.params().iter().enumerate() {
                    if param.mode == ParamMode::Out {
                        call.set_argument(index, manager.dummy_for(&param.ty));
                    }
                }
                call.set_return_value(manager.dummy_for(method.return_type()));
                Ok(())
            }
        }
    }
}

fn apply_event(manager: &FakeManager, call: &mut InterceptedCall) -> Result<(), FakeError> {
    let kind = call.method().kind();
    call.set_return_value(Value::Unit);
    let argument = call.arguments().get(0).cloned();
    match (kind, argument) {
        (MethodKind::EventAdd(event), Some(Value::Handler(handler))) => {
            manager.with_events(|events| events.add(event, handler));
            Ok(())
        }
        (MethodKind::EventAdd(event), Some(Value::Raise(raise))) => {
            let handlers = manager.with_events(|events| events.handlers(event));
            invoke_all(&handlers, raise.arguments())
        }
        (MethodKind::EventRemove(event), Some(Value::Handler(handler))) => {
            manager.with_events(|events| events.remove(event, &handler));
            Ok(())
        }
        _ => Ok(()),
    }
}

fn apply_object_member(manager: &FakeManager, call: &mut InterceptedCall) {
    let value = match call.method().kind() {
        MethodKind::Equals => {
            let other = call.arguments().get(0).and_then(Value::as_object);
            Value::Bool(other.is_some_and(|other| manager.is_faked_object(other)))
        }
        MethodKind::HashCode => {
            Value::Int(i64::try_from(manager.id().value()).unwrap_or(i64::MAX))
        }
        _ => Value::Str(manager.display_name().to_owned()),
    };
    call.set_return_value(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::MethodInfo;
    use crate::value::{CancellationToken, TypeTag};

    #[test]
    fn fallback_order_is_fixed() {
        let get = MethodInfo::getter("IUser", "Token", TypeTag::Token);
        let canceled = InterceptedCall::new(
            MethodInfo::builder("IUser", "Save")
                .param("token", TypeTag::Token)
                .build(),
            vec![Value::Token(CancellationToken::canceled())],
        );
        assert_eq!(BuiltInRule::select(&InterceptedCall::new(get, Vec::new())), BuiltInRule::AutoFakeProperty);
        assert_eq!(BuiltInRule::select(&canceled), BuiltInRule::Cancellation);
        assert_eq!(
            BuiltInRule::select(&InterceptedCall::new(MethodInfo::hash_code("IUser"), Vec::new())),
            BuiltInRule::ObjectMembers
        );
        assert_eq!(
            BuiltInRule::select(&InterceptedCall::new(MethodInfo::event_add("IUser", "Saved"), vec![Value::Null])),
            BuiltInRule::EventHandling
        );
    }

    #[test]
    fn live_token_does_not_cancel() {
        let save = MethodInfo::builder("IUser", "Save")
            .param("token", TypeTag::Token)
            .build();
        let call = InterceptedCall::new(save, vec![Value::Token(CancellationToken::new())]);
        assert_eq!(BuiltInRule::select(&call), BuiltInRule::DefaultReturnValue);
    }
}
