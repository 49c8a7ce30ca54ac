// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cross-fake ordering: sequence numbers and ordered assertions.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use mimic_core::{CallMatcher, FakeContext, FakeError, FakeOptions, Repeated, SequenceNumber, Value};
use mimic_dry_tests::{Calculator, FakeFixture, SteppedSequence};

#[test]
fn sequence_numbers_are_unique_across_threads_and_fakes() {
    let fx = FakeFixture::new().unwrap();
    let fakes: Vec<_> = (0..4)
        .map(|_| Arc::new(fx.sibling(FakeOptions::new()).unwrap()))
        .collect();

    let handles: Vec<_> = fakes
        .iter()
        .map(|fake| {
            let fake = Arc::clone(fake);
            thread::spawn(move || {
                for i in 0..250 {
                    fake.call(Calculator::negate(), vec![Value::Int(i)]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut seen = HashSet::new();
    for fake in &fakes {
        let calls = fake.manager.recorded_calls();
        assert_eq!(calls.len(), 250);
        assert!(calls
            .windows(2)
            .all(|w| w[0].sequence_number() < w[1].sequence_number()));
        assert_eq!(
            fake.manager.last_sequence_number(),
            calls.last().map(|c| c.sequence_number())
        );
        for call in calls {
            assert!(seen.insert(call.sequence_number()));
        }
    }
    assert_eq!(seen.len(), 1000);
}

#[test]
fn concurrent_calls_on_one_fake_are_all_recorded() {
    let fx = Arc::new(FakeFixture::new().unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fx = Arc::clone(&fx);
            thread::spawn(move || {
                for _ in 0..100 {
                    fx.call(Calculator::clear(), Vec::new()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let calls = fx.manager.recorded_calls();
    assert_eq!(calls.len(), 800);
    assert!(calls.iter().all(|c| c.is_complete()));
    assert!(calls
        .windows(2)
        .all(|w| w[0].sequence_number() < w[1].sequence_number()));
}

#[test]
fn injected_sequence_source_is_used() {
    let source = Arc::new(SteppedSequence::new(100, 10));
    let context = FakeContext::builder()
        .sequence_source(source.clone())
        .build();
    let fx = FakeFixture::with_options(context, FakeOptions::new()).unwrap();
    fx.call(Calculator::clear(), Vec::new()).unwrap();
    fx.call(Calculator::clear(), Vec::new()).unwrap();
    let seqs: Vec<_> = fx
        .manager
        .recorded_calls()
        .iter()
        .map(|c| c.sequence_number())
        .collect();
    assert_eq!(seqs, vec![SequenceNumber::from_raw(100), SequenceNumber::from_raw(110)]);
    assert_eq!(source.draws(), 2);
}

fn three_calls_on_two_fakes() -> (FakeFixture, FakeFixture) {
    let first = FakeFixture::new().unwrap();
    let second = first.sibling(FakeOptions::new().named("second")).unwrap();
    first.call(Calculator::add(), vec![Value::Int(1), Value::Int(2)]).unwrap();
    second.call(Calculator::negate(), vec![Value::Int(3)]).unwrap();
    first.call(Calculator::clear(), Vec::new()).unwrap();
    (first, second)
}

#[test]
fn ordered_assertion_accepts_actual_order() {
    let (first, second) = three_calls_on_two_fakes();
    let ordered = first.context.sequential();
    let once = Repeated::once();
    ordered
        .check_next_call_matching(&first.manager, &CallMatcher::method(&Calculator::add()), &once)
        .unwrap();
    ordered
        .check_next_call_matching(&second.manager, &CallMatcher::method(&Calculator::negate()), &once)
        .unwrap();
    ordered
        .check_next_call_matching(&first.manager, &CallMatcher::method(&Calculator::clear()), &once)
        .unwrap();
}

#[test]
fn ordered_assertion_skips_unasserted_calls() {
    let (first, _second) = three_calls_on_two_fakes();
    let ordered = first.context.sequential();
    ordered
        .check_next_call(
            &first.manager,
            |c| c.method().name() == "Add",
            "Add",
            &Repeated::once(),
        )
        .unwrap();
    ordered
        .check_next_call(
            &first.manager,
            |c| c.method().name() == "Clear",
            "Clear",
            &Repeated::once(),
        )
        .unwrap();
}

#[test]
fn ordered_assertion_rejects_reversed_order_with_full_history() {
    let (first, second) = three_calls_on_two_fakes();
    let ordered = first.context.sequential();
    ordered
        .check_next_call_matching(&first.manager, &CallMatcher::method(&Calculator::clear()), &Repeated::once())
        .unwrap();
    ordered
        .check_next_call_matching(&second.manager, &CallMatcher::any_call(), &Repeated::AtLeast(0))
        .unwrap();
    let err = ordered
        .check_next_call_matching(&first.manager, &CallMatcher::method(&Calculator::add()), &Repeated::once())
        .unwrap_err();

    let FakeError::OrderAssertionFailed(message) = err else {
        unreachable!("expected an ordering failure");
    };
    let add = message.find("1: Faked ICalculator: ICalculator.Add(a: 1, b: 2)").unwrap();
    let negate = message.find("2: second: ICalculator.Negate(x: 3)").unwrap();
    let clear = message.find("3: Faked ICalculator: ICalculator.Clear()").unwrap();
    assert!(add < negate && negate < clear);
    assert!(message.contains("Faked ICalculator: ICalculator.Clear repeated exactly once"));
    assert!(message.contains("Faked ICalculator: ICalculator.Add repeated exactly once"));
}

#[test]
fn asserter_ignores_calls_made_while_evaluating() {
    let fx = FakeFixture::new().unwrap();
    fx.call(Calculator::clear(), Vec::new()).unwrap();
    let asserter = fx.context.asserter();
    let reentrant = Arc::clone(&fx.manager);
    let object = Arc::clone(&fx.object);
    asserter
        .must_have_happened(
            &fx.manager,
            move |call| {
                // A predicate that itself calls the fake must not see its own call.
                let mut nested = mimic_core::InterceptedCall::new(Calculator::clear(), Vec::new())
                    .with_target(mimic_core::ObjectRef::new(Arc::clone(&object)));
                reentrant.process(&mut nested).unwrap();
                call.method().name() == "Clear"
            },
            "Clear",
            &Repeated::once(),
        )
        .unwrap();
    assert_eq!(fx.manager.recorded_calls().len(), 2);
}

#[test]
fn failed_count_assertion_lists_calls() {
    let fx = FakeFixture::new().unwrap();
    fx.call(Calculator::negate(), vec![Value::Int(4)]).unwrap();
    let err = fx
        .context
        .asserter()
        .must_have_happened_matching(
            &fx.manager,
            &CallMatcher::method(&Calculator::add()),
            &Repeated::AtLeast(1),
        )
        .unwrap_err();
    assert!(err.is_assertion_failure());
    let message = err.to_string();
    assert!(message.contains("Expected to find it at least once but found it 0 times"));
    assert!(message.contains("1: Faked ICalculator: ICalculator.Negate(x: 4)"));
}
