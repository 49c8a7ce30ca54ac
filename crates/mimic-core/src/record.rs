// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Call records: what the ledger stores for each intercepted call.

use std::sync::{Arc, OnceLock};

use crate::call::{ArgumentList, InterceptedCall};
use crate::manager::FakeId;
use crate::method::MethodInfo;
use crate::sequence::SequenceNumber;
use crate::value::Value;

/// Record of one call to a fake.
///
/// Invariants
/// - The sequence number is assigned when the record enters the ledger,
///   before any rule runs, so calls a rule makes while applying are ordered
///   after the call that triggered them.
/// - The outcome (arguments after the call, return value) is written exactly
///   once, when the call finishes, including when the applied rule failed or
///   panicked. After that the record never changes.
#[derive(Debug)]
pub struct CompletedCall {
    sequence: SequenceNumber,
    fake: FakeId,
    fake_name: Arc<str>,
    method: Arc<MethodInfo>,
    arguments: ArgumentList,
    outcome: OnceLock<CallOutcome>,
}

/// The part of a record written when the call finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Arguments after the rule ran (captures out/ref writes).
    pub arguments_after_call: ArgumentList,
    /// Return value, if the rule set one.
    pub return_value: Option<Value>,
}

impl CompletedCall {
    pub(crate) fn begin(
        sequence: SequenceNumber,
        fake: FakeId,
        fake_name: Arc<str>,
        call: &InterceptedCall,
    ) -> Self {
        Self {
            sequence,
            fake,
            fake_name,
            method: Arc::clone(call.method()),
            arguments: call.arguments().clone(),
            outcome: OnceLock::new(),
        }
    }

    /// Writes the outcome. Later writes are ignored.
    pub(crate) fn finish(&self, call: &InterceptedCall) {
        let _ = self.outcome.set(CallOutcome {
            arguments_after_call: call.arguments().clone(),
            return_value: call.return_value().cloned(),
        });
    }

    /// Position in the cross-fake timeline.
    pub fn sequence_number(&self) -> SequenceNumber {
        self.sequence
    }

    /// The fake the call was made on.
    pub fn fake(&self) -> FakeId {
        self.fake
    }

    /// Display name of the fake the call was made on.
    pub fn fake_name(&self) -> &str {
        &self.fake_name
    }

    /// The member that was called.
    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    /// Arguments as passed by the caller.
    pub fn arguments(&self) -> &ArgumentList {
        &self.arguments
    }

    /// Arguments after the call; the passed arguments while still in flight.
    pub fn arguments_after_call(&self) -> &ArgumentList {
        self.outcome
            .get()
            .map_or(&self.arguments, |o| &o.arguments_after_call)
    }

    /// The value returned to the caller, once the call has finished.
    pub fn return_value(&self) -> Option<&Value> {
        self.outcome.get().and_then(|o| o.return_value.as_ref())
    }

    /// Whether the call has finished.
    pub fn is_complete(&self) -> bool {
        self.outcome.get().is_some()
    }
}
