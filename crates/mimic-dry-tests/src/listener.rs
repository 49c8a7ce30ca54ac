// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Listener that records hook invocations.

use std::sync::{Arc, Mutex, PoisonError};

use mimic_core::{CompletedCall, InterceptedCall, InterceptionListener};

/// Shared, ordered log of hook invocations, e.g. `"a:before:Add"`.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl HookLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Copy of the entries so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Writes `"<label>:before:<method>"` and
/// `"<label>:after:<method>:<complete>"` into a [`HookLog`].
#[derive(Debug, Clone)]
pub struct RecordingListener {
    label: String,
    log: HookLog,
}

impl RecordingListener {
    /// A listener writing to `log` under `label`.
    pub fn new(label: impl Into<String>, log: HookLog) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            log,
        })
    }
}

impl InterceptionListener for RecordingListener {
    fn on_before_call_intercepted(&self, call: &InterceptedCall) {
        self.log
            .push(format!("{}:before:{}", self.label, call.method().name()));
    }

    fn on_after_call_intercepted(&self, call: &CompletedCall) {
        self.log.push(format!(
            "{}:after:{}:{}",
            self.label,
            call.method().name(),
            call.is_complete()
        ));
    }
}
