// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Mimic crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`error`] - Error type rules can be configured to raise
//! - [`fixture`] - A context plus one faked instance, ready to call
//! - [`listener`] - Listener that records hook order into a shared log
//! - [`methods`] - Method catalog for a small calculator interface
//! - [`rules`] - Scripted rule builder (predicate, outcome, limit)
//! - [`sequence`] - Deterministic, instrumented sequence source

pub mod error;
pub mod fixture;
pub mod listener;
pub mod methods;
pub mod rules;
pub mod sequence;

// Re-export commonly used items at crate root for convenience
pub use error::TestError;
pub use fixture::FakeFixture;
pub use listener::{HookLog, RecordingListener};
pub use methods::Calculator;
pub use rules::{ScriptedRule, ScriptedRuleBuilder};
pub use sequence::SteppedSequence;
