// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use proptest::prelude::*;

use mimic_core::Value;
use mimic_dry_tests::{Calculator, FakeFixture, ScriptedRuleBuilder};

#[derive(Debug, Clone)]
struct RuleSpec {
    first: bool,
    applies: bool,
    max_times: Option<u32>,
}

fn rule_spec() -> impl Strategy<Value = RuleSpec> {
    (any::<bool>(), any::<bool>(), prop::option::of(0_u32..4)).prop_map(|(first, applies, max_times)| {
        RuleSpec {
            first,
            applies,
            max_times,
        }
    })
}

struct ModelEntry {
    id: i64,
    applies: bool,
    max_times: Option<u32>,
    used: u32,
}

proptest! {
    // Selection is the first applicable, non-exhausted entry; ties are broken
    // purely by position, and unclaimed calls fall through to the zero value.
    #[test]
    fn selects_first_applicable_unexhausted_entry(
        specs in prop::collection::vec(rule_spec(), 0..8),
        calls in 1_usize..12,
    ) {
        let fx = FakeFixture::new().unwrap();
        let mut model: Vec<ModelEntry> = Vec::new();

        for (i, spec) in specs.iter().enumerate() {
            let id = i64::try_from(i).unwrap() + 1;
            let mut builder = ScriptedRuleBuilder::new(format!("rule {id}")).returns(Value::Int(id));
            if !spec.applies {
                builder = builder.never_applies();
            }
            if let Some(max) = spec.max_times {
                builder = builder.times(max);
            }
            let entry = ModelEntry { id, applies: spec.applies, max_times: spec.max_times, used: 0 };
            if spec.first {
                fx.manager.add_rule_first(builder.build());
                model.insert(0, entry);
            } else {
                fx.manager.add_rule_last(builder.build());
                model.push(entry);
            }
        }

        for _ in 0..calls {
            let expected = model
                .iter_mut()
                .find(|e| e.applies && e.max_times.is_none_or(|max| e.used < max))
                .map_or(0, |e| {
                    e.used += 1;
                    e.id
                });
            let actual = fx.call_value(Calculator::negate(), vec![Value::Int(1)]).unwrap();
            prop_assert_eq!(actual, Some(Value::Int(expected)));
        }

        let handles = fx.manager.rules();
        prop_assert_eq!(handles.len(), model.len());
        for (handle, entry) in handles.iter().zip(&model) {
            prop_assert_eq!(handle.times_called(), entry.used);
            if let Some(max) = entry.max_times {
                prop_assert!(handle.times_called() <= max);
            }
        }
    }
}
