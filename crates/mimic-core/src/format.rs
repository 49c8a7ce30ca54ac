// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plain-text call descriptions for error messages.

use crate::call::ArgumentList;
use crate::method::MethodInfo;
use crate::record::CompletedCall;

/// Renders calls for diagnostics. Richer formatting lives outside the core.
pub trait CallFormatter: Send + Sync {
    /// Describes a call to `method` with `arguments`.
    fn describe_call(&self, method: &MethodInfo, arguments: &ArgumentList) -> String;

    /// Describes a recorded call, prefixed with the fake's name.
    fn describe_record(&self, call: &CompletedCall) -> String {
        format!(
            "{}: {}",
            call.fake_name(),
            self.describe_call(call.method(), call.arguments())
        )
    }
}

/// `Type.Method(name: value, ...)` formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCallFormatter;

impl CallFormatter for PlainCallFormatter {
    fn describe_call(&self, method: &MethodInfo, arguments: &ArgumentList) -> String {
        let rendered: Vec<String> = arguments
            .iter()
            .enumerate()
            .map(|(i, value)| match method.params().get(i) {
                Some(param) => format!("{}: {value}", param.name),
                None => value.to_string(),
            })
            .collect();
        format!("{method}({})", rendered.join(", "))
    }
}
