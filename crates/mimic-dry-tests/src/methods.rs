// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Method catalog for the `ICalculator` test interface.
//!
//! Every constructor builds a fresh [`MethodInfo`]; two calls to the same
//! constructor produce equal ids, which is all the engine compares.

use std::sync::Arc;

use mimic_core::{MethodInfo, TypeTag};

/// Members of `ICalculator`.
pub struct Calculator;

impl Calculator {
    /// Declaring type name.
    pub const TYPE: &'static str = "ICalculator";

    /// `int Add(int a, int b)`.
    pub fn add() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Add")
            .param("a", TypeTag::Int)
            .param("b", TypeTag::Int)
            .returns(TypeTag::Int)
            .build()
    }

    /// `int Negate(int x)`.
    pub fn negate() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Negate")
            .param("x", TypeTag::Int)
            .returns(TypeTag::Int)
            .build()
    }

    /// `void Clear()`.
    pub fn clear() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Clear").build()
    }

    /// `bool TryParse(string text, out int value)`.
    pub fn try_parse() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "TryParse")
            .param("text", TypeTag::Str)
            .out_param("value", TypeTag::Int)
            .returns(TypeTag::Bool)
            .build()
    }

    /// `void Accumulate(ref int total, int amount)`.
    pub fn accumulate() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Accumulate")
            .ref_param("total", TypeTag::Int)
            .param("amount", TypeTag::Int)
            .build()
    }

    /// `int Compute(int x, CancellationToken token)`.
    pub fn compute() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Compute")
            .param("x", TypeTag::Int)
            .param("token", TypeTag::Token)
            .returns(TypeTag::Int)
            .build()
    }

    /// `IDisplay Display()`.
    pub fn display() -> Arc<MethodInfo> {
        MethodInfo::builder(Self::TYPE, "Display")
            .returns(TypeTag::object("IDisplay"))
            .build()
    }

    /// Getter of `string Mode`.
    pub fn mode_get() -> Arc<MethodInfo> {
        MethodInfo::getter(Self::TYPE, "Mode", TypeTag::Str)
    }

    /// Setter of `string Mode`.
    pub fn mode_set() -> Arc<MethodInfo> {
        MethodInfo::setter(Self::TYPE, "Mode", TypeTag::Str)
    }

    /// Add accessor of `event Computed`.
    pub fn computed_add() -> Arc<MethodInfo> {
        MethodInfo::event_add(Self::TYPE, "Computed")
    }

    /// Remove accessor of `event Computed`.
    pub fn computed_remove() -> Arc<MethodInfo> {
        MethodInfo::event_remove(Self::TYPE, "Computed")
    }

    /// `bool Equals(object other)`.
    pub fn equals() -> Arc<MethodInfo> {
        MethodInfo::equals(Self::TYPE)
    }

    /// `int GetHashCode()`.
    pub fn hash_code() -> Arc<MethodInfo> {
        MethodInfo::hash_code(Self::TYPE)
    }

    /// `string ToString()`.
    pub fn to_string_member() -> Arc<MethodInfo> {
        MethodInfo::to_string_member(Self::TYPE)
    }
}
