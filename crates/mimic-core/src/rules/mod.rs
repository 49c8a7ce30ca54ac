// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rule implementations shipped with the engine.

pub mod builtin;
pub mod configured;
pub mod matcher;
pub mod property;
pub mod strict;
pub mod wrapped;

pub use builtin::{BuiltInRule, FALLBACK_ORDER};
pub use configured::{ConfiguredRule, RuleBuilder};
pub use matcher::{ArgumentConstraint, CallMatcher};
pub use property::PropertyBehaviorRule;
pub use strict::StrictRule;
pub use wrapped::WrappedObjectRule;
