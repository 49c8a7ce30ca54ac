// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Strict-fake rule: any call nobody configured is an error.

use std::sync::Arc;

use crate::call::InterceptedCall;
use crate::config::StrictOptions;
use crate::error::FakeError;
use crate::format::CallFormatter;
use crate::rule::CallRule;

/// Held by a strict fake outside its chain and consulted only for calls no
/// chain entry claimed, before the built-in fallbacks.
pub struct StrictRule {
    options: StrictOptions,
    fake_name: String,
    formatter: Arc<dyn CallFormatter>,
}

impl StrictRule {
    /// A strict rule for the fake named `fake_name`.
    pub fn new(options: StrictOptions, fake_name: impl Into<String>, formatter: Arc<dyn CallFormatter>) -> Self {
        Self {
            options,
            fake_name: fake_name.into(),
            formatter,
        }
    }

    /// The allow-list.
    pub fn options(&self) -> StrictOptions {
        self.options
    }
}

impl CallRule for StrictRule {
    fn is_applicable_to(&self, call: &InterceptedCall) -> bool {
        !self.options.allows(call.method().kind())
    }

    fn apply(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        Err(FakeError::UnexpectedCall {
            call: format!(
                "{}: {}",
                self.fake_name,
                self.formatter.describe_call(call.method(), call.arguments())
            ),
        })
    }

    fn describe(&self) -> String {
        String::from("strict: reject unconfigured calls")
    }
}

impl std::fmt::Debug for StrictRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrictRule")
            .field("options", &self.options)
            .field("fake_name", &self.fake_name)
            .finish_non_exhaustive()
    }
}
