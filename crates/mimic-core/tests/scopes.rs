// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scope lifecycle: rule unwinding and call visibility.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use mimic_core::{CallMatcher, ConfiguredRule, FakeOptions, Repeated, Value};
use mimic_dry_tests::{Calculator, FakeFixture, ScriptedRuleBuilder};

#[test]
fn nested_scopes_remove_exactly_their_own_rules() {
    let fx = FakeFixture::new().unwrap();
    let outside = fx
        .manager
        .add_rule_last(ScriptedRuleBuilder::new("outside").never_applies().build());

    let scope_a = fx.context.create_scope();
    let r1 = fx
        .manager
        .add_rule_first(ScriptedRuleBuilder::new("r1").never_applies().build());
    {
        let scope_b = fx.context.create_scope();
        let r2 = fx
            .manager
            .add_rule_first(ScriptedRuleBuilder::new("r2").never_applies().build());
        assert_eq!(fx.manager.rules(), vec![r2, r1.clone(), outside.clone()]);
        scope_b.close();
    }
    assert_eq!(fx.manager.rules(), vec![r1, outside.clone()]);
    drop(scope_a);
    assert_eq!(fx.manager.rules(), vec![outside]);
}

#[test]
fn scope_unwind_is_by_identity_not_position() {
    let fx = FakeFixture::new().unwrap();
    let scope = fx.context.create_scope();
    let inside = fx
        .manager
        .add_rule_last(ScriptedRuleBuilder::new("inside").never_applies().build());
    drop(scope);

    // A rule added after the scope closed, at the position the scoped rule
    // used to have, survives a second unwind attempt.
    let after = fx
        .manager
        .add_rule_last(ScriptedRuleBuilder::new("after").never_applies().build());
    assert!(!fx.manager.remove_rule(&inside));
    assert_eq!(fx.manager.rules(), vec![after]);
}

#[test]
fn rules_the_property_fallback_adds_outlive_the_scope() {
    let fx = FakeFixture::new().unwrap();
    {
        let _scope = fx.context.create_scope();
        fx.call(Calculator::mode_set(), vec![Value::str("rpn")]).unwrap();
    }
    assert_eq!(
        fx.call_value(Calculator::mode_get(), Vec::new()).unwrap(),
        Some(Value::str("rpn"))
    );
}

#[test]
fn rules_from_creation_options_are_not_scope_tracked() {
    let fx = FakeFixture::new().unwrap();
    let scope = fx.context.create_scope();
    let other = fx
        .sibling(FakeOptions::new().configure(|manager| {
            manager.add_rule_first(
                ConfiguredRule::builder(CallMatcher::method(&Calculator::negate()))
                    .returns(Value::Int(-8))
                    .build(),
            );
            Ok(())
        }))
        .unwrap();
    drop(scope);
    assert_eq!(
        other.call_value(Calculator::negate(), vec![Value::Int(8)]).unwrap(),
        Some(Value::Int(-8))
    );
}

#[test]
fn calls_within_scope_include_nested_scopes() {
    let fx = FakeFixture::new().unwrap();
    fx.call(Calculator::clear(), Vec::new()).unwrap();

    let outer = fx.context.create_scope();
    fx.call(Calculator::add(), vec![Value::Int(1), Value::Int(2)]).unwrap();
    {
        let inner = fx.context.create_scope();
        fx.call(Calculator::negate(), vec![Value::Int(1)]).unwrap();
        let names: Vec<_> = inner
            .calls_within_scope(&fx.manager)
            .iter()
            .map(|c| c.method().name().to_owned())
            .collect();
        assert_eq!(names, vec!["Negate"]);
    }
    let names: Vec<_> = outer
        .calls_within_scope(&fx.manager)
        .iter()
        .map(|c| c.method().name().to_owned())
        .collect();
    assert_eq!(names, vec!["Add", "Negate"]);
    drop(outer);

    // With no scope open the whole ledger is visible.
    assert_eq!(fx.context.calls_within_current_scope(&fx.manager).len(), 3);
}

#[test]
fn asserter_only_counts_calls_of_the_current_scope() {
    let fx = FakeFixture::new().unwrap();
    let asserter = fx.context.asserter();
    let add = CallMatcher::method(&Calculator::add());
    fx.call(Calculator::add(), vec![Value::Int(1), Value::Int(1)]).unwrap();

    let scope = fx.context.create_scope();
    asserter.must_not_have_happened(&fx.manager, &add).unwrap();
    fx.call(Calculator::add(), vec![Value::Int(2), Value::Int(2)]).unwrap();
    asserter
        .must_have_happened_matching(&fx.manager, &add, &Repeated::once())
        .unwrap();
    drop(scope);

    asserter
        .must_have_happened_matching(&fx.manager, &add, &Repeated::twice())
        .unwrap();
}
