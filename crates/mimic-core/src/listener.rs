// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Interception listeners: observers notified around every processed call.

use crate::call::InterceptedCall;
use crate::record::CompletedCall;

/// Observer notified before and after a fake processes a call.
///
/// "Before" hooks run in registration order; "after" hooks run in reverse
/// registration order and run even when the applied rule failed or panicked.
/// Both hooks run outside the fake's chain lock.
pub trait InterceptionListener: Send + Sync {
    /// Called before any rule is selected.
    fn on_before_call_intercepted(&self, call: &InterceptedCall) {
        let _ = call;
    }

    /// Called with the finished record.
    fn on_after_call_intercepted(&self, call: &CompletedCall) {
        let _ = call;
    }
}
