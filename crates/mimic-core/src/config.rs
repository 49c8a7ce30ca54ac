// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-fake creation options.
//!
//! The data part of [`FakeOptions`] is plain serde and can be loaded from
//! JSON; the hooks (wrapped target, configuration callbacks) are set in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::call::CallTarget;
use crate::error::FakeError;
use crate::manager::FakeManager;
use crate::method::MethodKind;

/// Callback run against a new fake before its baseline is captured.
pub type ConfigureFn = Arc<dyn Fn(&FakeManager) -> Result<(), FakeError> + Send + Sync>;

/// Error type for option loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Which members a strict fake still answers without a configured rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct StrictOptions {
    /// Allow `Equals`.
    pub allow_equals: bool,
    /// Allow `GetHashCode`.
    pub allow_hash_code: bool,
    /// Allow `ToString`.
    pub allow_to_string: bool,
    /// Allow event add/remove (and raising through the add accessor).
    pub allow_event_subscription: bool,
}

impl StrictOptions {
    /// Allows all three object-identity members.
    pub fn allow_object_members() -> Self {
        Self {
            allow_equals: true,
            allow_hash_code: true,
            allow_to_string: true,
            allow_event_subscription: false,
        }
    }

    /// Whether calls of `kind` bypass strictness.
    pub fn allows(&self, kind: MethodKind) -> bool {
        match kind {
            MethodKind::Equals => self.allow_equals,
            MethodKind::HashCode => self.allow_hash_code,
            MethodKind::ToString => self.allow_to_string,
            MethodKind::EventAdd(_) | MethodKind::EventRemove(_) => self.allow_event_subscription,
            MethodKind::Ordinary | MethodKind::PropertyGetter(_) | MethodKind::PropertySetter(_) => {
                false
            }
        }
    }
}

/// Options applied when a fake is created.
///
/// Applied in this order: wrapped target, call-base-methods, strictness,
/// configuration callbacks. None of the rules they add are scope-tracked, and
/// all of them are part of the baseline [`FakeManager::restore`] returns to.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeOptions {
    /// Display name used by `ToString` and diagnostics.
    pub name: Option<String>,
    /// Make the fake strict with the given allow-list.
    pub strict: Option<StrictOptions>,
    /// Delegate unconfigured calls to the base implementation.
    pub call_base_methods: bool,
    /// Real object every call is forwarded to.
    #[serde(skip)]
    pub wrapping: Option<Arc<dyn CallTarget>>,
    /// Configuration callbacks.
    #[serde(skip)]
    pub configure: Vec<ConfigureFn>,
}

impl FakeOptions {
    /// Default options: loose, unnamed, not wrapping anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the serializable part of the options.
    ///
    /// # Errors
    /// Returns [`ConfigError::Serde`] when `json` is not valid options JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Makes the fake strict with an empty allow-list.
    pub fn strict(self) -> Self {
        self.strict_with(StrictOptions::default())
    }

    /// Makes the fake strict with the given allow-list.
    pub fn strict_with(mut self, options: StrictOptions) -> Self {
        self.strict = Some(options);
        self
    }

    /// Delegates unconfigured calls to the base implementation.
    pub fn calling_base_methods(mut self) -> Self {
        self.call_base_methods = true;
        self
    }

    /// Forwards every unconfigured call to `target`.
    pub fn wrapping(mut self, target: Arc<dyn CallTarget>) -> Self {
        self.wrapping = Some(target);
        self
    }

    /// Adds a configuration callback.
    pub fn configure<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FakeManager) -> Result<(), FakeError> + Send + Sync + 'static,
    {
        self.configure.push(Arc::new(callback));
        self
    }
}

impl fmt::Debug for FakeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeOptions")
            .field("name", &self.name)
            .field("strict", &self.strict)
            .field("call_base_methods", &self.call_base_methods)
            .field("wrapping", &self.wrapping.is_some())
            .field("configure", &self.configure.len())
            .finish()
    }
}
