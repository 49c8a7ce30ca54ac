// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Call dispatch: rule selection, fallbacks, recording and listeners.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use mimic_core::{
    CallMatcher, CallTarget, CancellationToken, ConfiguredRule, EventHandler, EventRaise, FakeContext,
    FakeError, FakeOptions, InterceptedCall, InterceptionListener, MethodInfo, StrictOptions, Value,
};
use mimic_dry_tests::{Calculator, FakeFixture, HookLog, RecordingListener, ScriptedRuleBuilder, TestError};

#[test]
fn first_applicable_rule_wins_by_position() {
    let fx = FakeFixture::new().unwrap();
    fx.manager
        .add_rule_last(ScriptedRuleBuilder::new("last").returns(Value::Int(2)).build());
    fx.manager
        .add_rule_first(ScriptedRuleBuilder::new("first").returns(Value::Int(1)).build());
    fx.manager.add_rule_first(
        ScriptedRuleBuilder::new("never")
            .never_applies()
            .returns(Value::Int(0))
            .build(),
    );

    let value = fx.call_value(Calculator::add(), vec![Value::Int(1), Value::Int(1)]).unwrap();
    assert_eq!(value, Some(Value::Int(1)));
}

#[test]
fn exhausted_rule_is_skipped_but_kept() {
    let fx = FakeFixture::new().unwrap();
    let limited = ScriptedRuleBuilder::new("twice").returns(Value::Int(7)).times(2).build();
    fx.manager
        .add_rule_last(ScriptedRuleBuilder::new("fallthrough").returns(Value::Int(9)).build());
    let handle = fx.manager.add_rule_first(limited.clone());

    let values: Vec<_> = (0..4)
        .map(|_| fx.call_value(Calculator::negate(), vec![Value::Int(3)]).unwrap())
        .collect();
    assert_eq!(
        values,
        vec![Some(Value::Int(7)), Some(Value::Int(7)), Some(Value::Int(9)), Some(Value::Int(9))]
    );
    assert_eq!(limited.applied(), 2);
    assert!(handle.is_exhausted());
    assert_eq!(handle.times_called(), 2);
    assert_eq!(fx.manager.rules().len(), 2);
}

#[test]
fn failing_rule_still_records_and_notifies() {
    let fx = FakeFixture::new().unwrap();
    let log = HookLog::new();
    fx.manager
        .add_interception_listener(RecordingListener::new("a", log.clone()));
    fx.manager
        .add_interception_listener(RecordingListener::new("b", log.clone()));
    fx.manager.add_rule_first(
        ScriptedRuleBuilder::new("fail")
            .fails_with(TestError::raised("nope"))
            .build(),
    );

    let err = fx.call(Calculator::clear(), Vec::new()).unwrap_err();
    assert_eq!(
        err.raised_ref::<TestError>(),
        Some(&TestError::Failure("nope".to_owned()))
    );
    assert_eq!(fx.manager.recorded_calls().len(), 1);
    assert!(fx.manager.recorded_calls()[0].is_complete());
    assert_eq!(
        log.entries(),
        vec!["a:before:Clear", "b:before:Clear", "b:after:Clear:true", "a:after:Clear:true"]
    );
}

#[test]
fn panicking_rule_still_records_and_notifies() {
    let fx = FakeFixture::new().unwrap();
    let log = HookLog::new();
    fx.manager
        .add_interception_listener(RecordingListener::new("only", log.clone()));
    fx.manager
        .add_rule_first(ScriptedRuleBuilder::new("boom").panics_with("rule exploded").build());

    let outcome = catch_unwind(AssertUnwindSafe(|| fx.call(Calculator::clear(), Vec::new())));
    assert!(outcome.is_err());
    let calls = fx.manager.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_complete());
    assert_eq!(log.entries(), vec!["only:before:Clear", "only:after:Clear:true"]);

    // The manager stays usable after the panic.
    fx.manager.remove_rule(&fx.manager.rules()[0]);
    assert!(fx.call(Calculator::clear(), Vec::new()).is_ok());
}

#[test]
fn removed_listener_is_not_notified() {
    let fx = FakeFixture::new().unwrap();
    let log = HookLog::new();
    let listener: Arc<dyn InterceptionListener> = RecordingListener::new("x", log.clone());
    fx.manager.add_interception_listener(Arc::clone(&listener));
    assert!(fx.manager.remove_interception_listener(&listener));
    assert!(!fx.manager.remove_interception_listener(&listener));
    fx.call(Calculator::clear(), Vec::new()).unwrap();
    assert!(log.entries().is_empty());
}

#[test]
fn configured_rule_writes_out_parameters_into_record() {
    let fx = FakeFixture::new().unwrap();
    fx.manager.add_rule_first(
        ConfiguredRule::builder(CallMatcher::method(&Calculator::try_parse()))
            .returns(true)
            .assigns_out_and_ref(vec![Value::Int(12)])
            .build(),
    );
    let call = fx
        .call(Calculator::try_parse(), vec![Value::str("12"), Value::Int(0)])
        .unwrap();
    assert_eq!(call.return_value(), Some(&Value::Bool(true)));
    assert_eq!(call.arguments().get(1), Some(&Value::Int(12)));

    let record = &fx.manager.recorded_calls()[0];
    assert_eq!(record.arguments().get(1), Some(&Value::Int(0)));
    assert_eq!(record.arguments_after_call().get(1), Some(&Value::Int(12)));
    assert_eq!(record.return_value(), Some(&Value::Bool(true)));
}

#[test]
fn unconfigured_out_parameter_gets_dummy() {
    let fx = FakeFixture::new().unwrap();
    let call = fx
        .call(Calculator::try_parse(), vec![Value::str("x"), Value::Int(55)])
        .unwrap();
    assert_eq!(call.arguments().get(1), Some(&Value::Int(0)));
    assert_eq!(call.return_value(), Some(&Value::Bool(false)));
}

#[test]
fn unconfigured_property_remembers_values() {
    let fx = FakeFixture::new().unwrap();
    assert_eq!(
        fx.call_value(Calculator::mode_get(), Vec::new()).unwrap(),
        Some(Value::str(""))
    );
    assert_eq!(fx.manager.rules().len(), 1);
    fx.call(Calculator::mode_set(), vec![Value::str("scientific")]).unwrap();
    assert_eq!(
        fx.call_value(Calculator::mode_get(), Vec::new()).unwrap(),
        Some(Value::str("scientific"))
    );
    // The setter found the property rule the getter created.
    assert_eq!(fx.manager.rules().len(), 1);
}

#[test]
fn setter_before_getter_creates_property_rule() {
    let fx = FakeFixture::new().unwrap();
    fx.call(Calculator::mode_set(), vec![Value::str("basic")]).unwrap();
    assert_eq!(
        fx.call_value(Calculator::mode_get(), Vec::new()).unwrap(),
        Some(Value::str("basic"))
    );
}

#[test]
fn canceled_token_cancels_unconfigured_call() {
    let fx = FakeFixture::new().unwrap();
    let err = fx
        .call(
            Calculator::compute(),
            vec![Value::Int(1), Value::Token(CancellationToken::canceled())],
        )
        .unwrap_err();
    assert!(matches!(err, FakeError::OperationCanceled { method } if method == "ICalculator.Compute"));

    let ok = fx
        .call_value(
            Calculator::compute(),
            vec![Value::Int(1), Value::Token(CancellationToken::new())],
        )
        .unwrap();
    assert_eq!(ok, Some(Value::Int(0)));
}

#[test]
fn configured_rule_beats_cancellation() {
    let fx = FakeFixture::new().unwrap();
    fx.manager.add_rule_first(
        ConfiguredRule::builder(CallMatcher::method(&Calculator::compute()))
            .returns(Value::Int(5))
            .build(),
    );
    let value = fx
        .call_value(
            Calculator::compute(),
            vec![Value::Int(1), Value::Token(CancellationToken::canceled())],
        )
        .unwrap();
    assert_eq!(value, Some(Value::Int(5)));
}

#[test]
fn events_subscribe_raise_and_unsubscribe() {
    let fx = FakeFixture::new().unwrap();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = EventHandler::new(move |args| {
        sink.lock().unwrap().push(args.to_vec());
        Ok(())
    });

    fx.call(Calculator::computed_add(), vec![Value::Handler(handler.clone())])
        .unwrap();
    fx.call(
        Calculator::computed_add(),
        vec![Value::Raise(EventRaise::with(vec![Value::Int(42)]))],
    )
    .unwrap();
    let event = Calculator::computed_add().kind().event().unwrap();
    fx.manager.raise_event(event, &[Value::Int(43)]).unwrap();
    assert_eq!(fx.manager.event_handlers(event).len(), 1);

    fx.call(Calculator::computed_remove(), vec![Value::Handler(handler)])
        .unwrap();
    fx.manager.raise_event(event, &[Value::Int(44)]).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![Value::Int(42)], vec![Value::Int(43)]]
    );
}

#[test]
fn event_handler_error_surfaces_unchanged() {
    let fx = FakeFixture::new().unwrap();
    let handler = EventHandler::new(|_| Err(FakeError::raised(TestError::Unavailable)));
    fx.call(Calculator::computed_add(), vec![Value::Handler(handler)])
        .unwrap();
    let err = fx
        .call(
            Calculator::computed_add(),
            vec![Value::Raise(EventRaise::with(Vec::new()))],
        )
        .unwrap_err();
    assert_eq!(err.raised_ref::<TestError>(), Some(&TestError::Unavailable));
}

#[test]
fn strict_fake_rejects_unconfigured_calls_only() {
    let fx = FakeFixture::with_options(
        FakeContext::new(),
        FakeOptions::new()
            .named("strict calculator")
            .strict_with(StrictOptions {
                allow_to_string: true,
                ..StrictOptions::default()
            }),
    )
    .unwrap();
    fx.manager.add_rule_first(
        ConfiguredRule::builder(CallMatcher::method(&Calculator::add()))
            .returns(Value::Int(3))
            .build(),
    );

    assert_eq!(
        fx.call_value(Calculator::add(), vec![Value::Int(1), Value::Int(2)]).unwrap(),
        Some(Value::Int(3))
    );
    assert_eq!(
        fx.call_value(Calculator::to_string_member(), Vec::new()).unwrap(),
        Some(Value::str("strict calculator"))
    );
    let err = fx.call(Calculator::negate(), vec![Value::Int(5)]).unwrap_err();
    match err {
        FakeError::UnexpectedCall { call } => {
            assert_eq!(call, "strict calculator: ICalculator.Negate(x: 5)");
        }
        other => unreachable!("expected UnexpectedCall, got {other:?}"),
    }
    // Rejected calls are still recorded.
    assert_eq!(fx.manager.recorded_calls().len(), 3);
}

#[test]
fn strict_fake_consults_rules_appended_after_creation() {
    let fx = FakeFixture::with_options(FakeContext::new(), FakeOptions::new().strict()).unwrap();
    assert!(fx.manager.is_strict());
    fx.manager.add_rule_last(
        ConfiguredRule::builder(CallMatcher::method(&Calculator::negate()))
            .returns(Value::Int(42))
            .build(),
    );

    assert_eq!(
        fx.call_value(Calculator::negate(), vec![Value::Int(1)]).unwrap(),
        Some(Value::Int(42))
    );
    assert!(matches!(
        fx.call(Calculator::clear(), Vec::new()).unwrap_err(),
        FakeError::UnexpectedCall { .. }
    ));
    // The rejection policy is not a chain entry.
    assert_eq!(fx.manager.rules().len(), 1);
}

#[test]
fn strict_fake_consults_rules_from_configure_callbacks() {
    let fx = FakeFixture::with_options(
        FakeContext::new(),
        FakeOptions::new().strict().configure(|manager| {
            manager.add_rule_last(
                ConfiguredRule::builder(CallMatcher::method(&Calculator::negate()))
                    .returns(Value::Int(-8))
                    .build(),
            );
            Ok(())
        }),
    )
    .unwrap();

    assert_eq!(
        fx.call_value(Calculator::negate(), vec![Value::Int(8)]).unwrap(),
        Some(Value::Int(-8))
    );
    assert!(fx.call(Calculator::add(), vec![Value::Int(1), Value::Int(2)]).is_err());

    fx.manager.restore().unwrap();
    assert!(fx.manager.is_strict());
    assert_eq!(
        fx.call_value(Calculator::negate(), vec![Value::Int(8)]).unwrap(),
        Some(Value::Int(-8))
    );
}

struct RealCalculator;

impl CallTarget for RealCalculator {
    fn invoke(
        &self,
        method: &MethodInfo,
        arguments: &mut mimic_core::ArgumentList,
    ) -> Result<Value, FakeError> {
        match method.name() {
            "Add" => {
                let sum: i64 = arguments.iter().filter_map(Value::as_int).sum();
                Ok(Value::Int(sum))
            }
            "Accumulate" => {
                let total = arguments.get(0).and_then(Value::as_int).unwrap_or_default();
                let amount = arguments.get(1).and_then(Value::as_int).unwrap_or_default();
                arguments.set(0, Value::Int(total + amount));
                Ok(Value::Unit)
            }
            _ => Ok(method.return_type().zero_value()),
        }
    }
}

#[test]
fn wrapped_fake_forwards_unconfigured_calls() {
    let fx = FakeFixture::with_options(
        FakeContext::new(),
        FakeOptions::new().wrapping(Arc::new(RealCalculator)),
    )
    .unwrap();
    assert_eq!(
        fx.call_value(Calculator::add(), vec![Value::Int(2), Value::Int(3)]).unwrap(),
        Some(Value::Int(5))
    );
    let call = fx
        .call(Calculator::accumulate(), vec![Value::Int(10), Value::Int(5)])
        .unwrap();
    assert_eq!(call.arguments().get(0), Some(&Value::Int(15)));

    fx.manager.add_rule_first(
        ConfiguredRule::builder(CallMatcher::method(&Calculator::add()))
            .returns(Value::Int(-1))
            .build(),
    );
    assert_eq!(
        fx.call_value(Calculator::add(), vec![Value::Int(2), Value::Int(3)]).unwrap(),
        Some(Value::Int(-1))
    );
}

#[test]
fn calls_base_method_uses_supplied_base() {
    let fx = FakeFixture::with_options(FakeContext::new(), FakeOptions::new().calling_base_methods())
        .unwrap();
    let mut call = InterceptedCall::new(Calculator::add(), vec![Value::Int(4), Value::Int(4)])
        .with_base(Arc::new(RealCalculator));
    fx.manager.process(&mut call).unwrap();
    assert_eq!(call.return_value(), Some(&Value::Int(8)));

    let err = fx.call(Calculator::add(), vec![Value::Int(4), Value::Int(4)]).unwrap_err();
    assert!(matches!(err, FakeError::NoBaseImplementation { .. }));
}

#[test]
fn hash_code_is_stable_per_fake() {
    let fx = FakeFixture::new().unwrap();
    let other = fx.sibling(FakeOptions::new()).unwrap();
    let a1 = fx.call_value(Calculator::hash_code(), Vec::new()).unwrap();
    let a2 = fx.call_value(Calculator::hash_code(), Vec::new()).unwrap();
    let b = other.call_value(Calculator::hash_code(), Vec::new()).unwrap();
    assert_eq!(a1, a2);
    assert_ne!(a1, b);
}
