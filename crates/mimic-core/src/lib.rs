// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! mimic-core: call interception and rule dispatch for fake objects.
//!
//! An interception point (a generated proxy, a hand-written stub) turns each
//! call on a faked instance into an [`InterceptedCall`] and hands it to that
//! instance's [`FakeManager`]. The manager records the call in a globally
//! sequenced ledger, applies exactly one rule from its chain (or a built-in
//! fallback), and returns the outcome. Scopes undo configuration, snapshots
//! restore a baseline, and the assertion types read the ledgers back.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod assert;
mod call;
mod config;
mod context;
mod dummy;
mod error;
mod events;
mod format;
mod ledger;
mod listener;
mod manager;
mod method;
mod record;
mod registry;
mod rule;
/// Rules shipped with the engine: configured, property, strict, wrapper and
/// the built-in fallbacks.
pub mod rules;
mod scope;
mod sequence;
mod sequential;
mod snapshot;
mod value;

/// Call-count assertions and repeat constraints.
pub use assert::{CallAsserter, Repeated};
/// In-flight calls and the targets that can execute them.
pub use call::{ArgumentList, CallTarget, InterceptedCall};
/// Per-fake creation options.
pub use config::{ConfigError, ConfigureFn, FakeOptions, StrictOptions};
/// The injected root object.
pub use context::{FakeContext, FakeContextBuilder};
/// Dummy values for unconfigured returns.
pub use dummy::{DefaultDummyFactory, DummyFactory, DummyProducer};
/// Error taxonomy.
pub use error::{FakeError, RaisedError};
/// Event subscriptions.
pub use events::EventRegistry;
/// Call descriptions for diagnostics.
pub use format::{CallFormatter, PlainCallFormatter};
/// Per-fake append-only ledger.
pub use ledger::CallLedger;
/// Observers around each processed call.
pub use listener::InterceptionListener;
/// The per-fake dispatch engine.
pub use manager::{FakeId, FakeManager};
/// Member identity and reflection data.
pub use method::{
    make_event_id, make_method_id, make_property_id, EventId, Hash, MethodBuilder, MethodId,
    MethodInfo, MethodKind, ParamInfo, ParamMode, PropertyId,
};
/// Call records.
pub use record::{CallOutcome, CompletedCall};
/// Rule extension point and chain handles.
pub use rule::{CallRule, RuleEntry, RuleHandle};
/// Re-exported rule types most callers need.
pub use rules::{BuiltInRule, CallMatcher, ConfiguredRule, RuleBuilder};
/// Scope guard.
pub use scope::FakeScope;
/// Cross-fake call sequencing.
pub use sequence::{LastSequence, SequenceAllocator, SequenceNumber, SequenceSource};
/// Ordered assertions across fakes.
pub use sequential::SequentialCallContext;
/// Dynamically typed values.
pub use value::{
    CancellationToken, EventHandler, EventRaise, HandlerFn, ObjectRef, TypeTag, Value,
};
