// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Call matching: which member, which arguments.

use std::fmt;
use std::sync::Arc;

use crate::call::{ArgumentList, InterceptedCall};
use crate::method::{MethodId, MethodInfo, MethodKind, PropertyId};
use crate::record::CompletedCall;
use crate::value::{TypeTag, Value};

type ValuePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type ArgumentsPredicate = Arc<dyn Fn(&ArgumentList) -> bool + Send + Sync>;
type CallPredicate = Arc<dyn Fn(&MethodInfo, &ArgumentList) -> bool + Send + Sync>;

/// Constraint on a single positional argument.
#[derive(Clone)]
pub enum ArgumentConstraint {
    /// Any value.
    Any,
    /// A value equal to the given one.
    Equal(Value),
    /// A value accepted by the predicate.
    Matching {
        /// Predicate over the argument.
        predicate: ValuePredicate,
        /// Text shown in diagnostics.
        description: String,
    },
}

impl ArgumentConstraint {
    /// A constraint accepting values for which `predicate` holds.
    pub fn matching<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Matching {
            predicate: Arc::new(predicate),
            description: description.into(),
        }
    }

    /// Whether `value` satisfies the constraint.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Equal(expected) => expected == value,
            Self::Matching { predicate, .. } => predicate(value),
        }
    }
}

impl From<Value> for ArgumentConstraint {
    fn from(value: Value) -> Self {
        Self::Equal(value)
    }
}

impl fmt::Display for ArgumentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("<any>"),
            Self::Equal(value) => write!(f, "{value}"),
            Self::Matching { description, .. } => write!(f, "<{description}>"),
        }
    }
}

impl fmt::Debug for ArgumentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgumentConstraint({self})")
    }
}

#[derive(Debug, Clone)]
enum MemberFilter {
    Any,
    Method { id: MethodId, label: String },
    PropertySetter { id: PropertyId, label: String },
    ReturnType(TypeTag),
}

/// Decides whether a call (live or recorded) is one a rule or assertion is
/// about.
///
/// All configured filters must hold: member, argument constraints, whole
/// argument-list predicate, and every call predicate.
#[derive(Clone)]
pub struct CallMatcher {
    member: MemberFilter,
    arguments: Option<Vec<ArgumentConstraint>>,
    arguments_predicate: Option<(ArgumentsPredicate, String)>,
    call_predicates: Vec<(CallPredicate, String)>,
}

impl CallMatcher {
    fn with_member(member: MemberFilter) -> Self {
        Self {
            member,
            arguments: None,
            arguments_predicate: None,
            call_predicates: Vec::new(),
        }
    }

    /// Matches every call.
    pub fn any_call() -> Self {
        Self::with_member(MemberFilter::Any)
    }

    /// Matches calls to `method` (including a property getter or setter).
    pub fn method(method: &MethodInfo) -> Self {
        Self::with_member(MemberFilter::Method {
            id: method.id(),
            label: method.to_string(),
        })
    }

    /// Matches the setter of the property `accessor` belongs to, whichever
    /// accessor is passed.
    ///
    /// Falls back to matching `accessor` itself when it is not a property
    /// accessor.
    pub fn property_setter(accessor: &MethodInfo) -> Self {
        match accessor.kind().property() {
            Some(id) => Self::with_member(MemberFilter::PropertySetter {
                id,
                label: format!("{}.{} setter", accessor.declaring_type(), accessor.name()),
            }),
            None => Self::method(accessor),
        }
    }

    /// Matches any call whose declared return type is `ty`.
    pub fn with_return_type(ty: TypeTag) -> Self {
        Self::with_member(MemberFilter::ReturnType(ty))
    }

    /// Requires each positional argument to satisfy the constraint at the
    /// same position; the argument count must match too.
    pub fn with_args<I, C>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ArgumentConstraint>,
    {
        self.arguments = Some(constraints.into_iter().map(Into::into).collect());
        self
    }

    /// Requires the whole argument list to satisfy `predicate`.
    pub fn when_arguments_match<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ArgumentList) -> bool + Send + Sync + 'static,
    {
        self.arguments_predicate = Some((Arc::new(predicate), description.into()));
        self
    }

    /// Adds a predicate over the called member and its arguments.
    pub fn where_call<F>(mut self, description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&MethodInfo, &ArgumentList) -> bool + Send + Sync + 'static,
    {
        self.call_predicates
            .push((Arc::new(predicate), description.into()));
        self
    }

    /// Whether a live call matches.
    pub fn matches(&self, call: &InterceptedCall) -> bool {
        self.matches_parts(call.method(), call.arguments())
    }

    /// Whether a recorded call matches, judged on the arguments as passed.
    pub fn matches_record(&self, call: &CompletedCall) -> bool {
        self.matches_parts(call.method(), call.arguments())
    }

    fn matches_parts(&self, method: &MethodInfo, arguments: &ArgumentList) -> bool {
        let member = match &self.member {
            MemberFilter::Any => true,
            MemberFilter::Method { id, .. } => method.id() == *id,
            MemberFilter::PropertySetter { id, .. } => {
                matches!(method.kind(), MethodKind::PropertySetter(p) if p == *id)
            }
            MemberFilter::ReturnType(ty) => method.return_type() == ty,
        };
        if !member {
            return false;
        }
        if let Some(constraints) = &self.arguments {
            if constraints.len() != arguments.len()
                || !constraints
                    .iter()
                    .zip(arguments)
                    .all(|(constraint, value)| constraint.matches(value))
            {
                return false;
            }
        }
        if let Some((predicate, _)) = &self.arguments_predicate {
            if !predicate(arguments) {
                return false;
            }
        }
        self.call_predicates
            .iter()
            .all(|(predicate, _)| predicate(method, arguments))
    }

    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        let mut out = match &self.member {
            MemberFilter::Any => String::from("any call"),
            MemberFilter::Method { label, .. } | MemberFilter::PropertySetter { label, .. } => {
                label.clone()
            }
            MemberFilter::ReturnType(ty) => format!("any call returning {ty}"),
        };
        if let Some(constraints) = &self.arguments {
            let rendered: Vec<String> = constraints.iter().map(ToString::to_string).collect();
            out.push('(');
            out.push_str(&rendered.join(", "));
            out.push(')');
        }
        if let Some((_, description)) = &self.arguments_predicate {
            out.push_str(" with arguments ");
            out.push_str(description);
        }
        for (_, description) in &self.call_predicates {
            out.push_str(" where ");
            out.push_str(description);
        }
        out
    }
}

impl fmt::Debug for CallMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallMatcher({})", self.describe())
    }
}
