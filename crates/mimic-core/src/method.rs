// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Method, property and event identity.
//!
//! The interception point describes each faked member with a [`MethodInfo`].
//! Identifiers are domain-separated BLAKE3 digests of the member's signature
//! so that the same member always hashes to the same id.
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;

use crate::value::TypeTag;

/// Canonical 256-bit hash used for member identifiers.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a faked method.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub Hash);

/// Strongly typed identifier for a property (shared by its getter and setter).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(pub Hash);

/// Strongly typed identifier for an event (shared by its add/remove accessors).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub Hash);

macro_rules! short_hex_debug {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($ty), hex::encode(&self.0[..8]))
            }
        }
    };
}

short_hex_debug!(MethodId);
short_hex_debug!(PropertyId);
short_hex_debug!(EventId);

/// Produces a stable, domain‑separated method identifier (prefix `b"method:"`) using BLAKE3.
pub fn make_method_id(signature: &str) -> MethodId {
    let mut hasher = Hasher::new();
    hasher.update(b"method:");
    hasher.update(signature.as_bytes());
    MethodId(hasher.finalize().into())
}

/// Produces a stable, domain‑separated property identifier (prefix `b"property:"`) using BLAKE3.
pub fn make_property_id(declaring_type: &str, property: &str) -> PropertyId {
    let mut hasher = Hasher::new();
    hasher.update(b"property:");
    hasher.update(declaring_type.as_bytes());
    hasher.update(b".");
    hasher.update(property.as_bytes());
    PropertyId(hasher.finalize().into())
}

/// Produces a stable, domain‑separated event identifier (prefix `b"event:"`) using BLAKE3.
pub fn make_event_id(declaring_type: &str, event: &str) -> EventId {
    let mut hasher = Hasher::new();
    hasher.update(b"event:");
    hasher.update(declaring_type.as_bytes());
    hasher.update(b".");
    hasher.update(event.as_bytes());
    EventId(hasher.finalize().into())
}

/// How an argument slot is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamMode {
    /// Passed by value; writes are not observed by the caller.
    In,
    /// Passed by reference; the callee may read and overwrite it.
    Ref,
    /// Output slot; the callee is expected to write it.
    Out,
}

impl ParamMode {
    /// Whether the caller observes writes to this slot.
    pub fn is_by_ref(self) -> bool {
        matches!(self, Self::Ref | Self::Out)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub ty: TypeTag,
    /// Passing mode.
    pub mode: ParamMode,
}

/// Structural role of a method.
///
/// Built-in rules key off this instead of naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Any ordinary member.
    Ordinary,
    /// Property getter.
    PropertyGetter(PropertyId),
    /// Property setter; the assigned value is the last argument.
    PropertySetter(PropertyId),
    /// Event add accessor; the handler is the only argument.
    EventAdd(EventId),
    /// Event remove accessor; the handler is the only argument.
    EventRemove(EventId),
    /// Object identity equality (`Equals`).
    Equals,
    /// Object identity hash (`GetHashCode`).
    HashCode,
    /// Object identity display (`ToString`).
    ToString,
}

impl MethodKind {
    /// Whether this is one of the object-identity members.
    pub fn is_object_member(self) -> bool {
        matches!(self, Self::Equals | Self::HashCode | Self::ToString)
    }

    /// The event this accessor belongs to, if any.
    pub fn event(self) -> Option<EventId> {
        match self {
            Self::EventAdd(id) | Self::EventRemove(id) => Some(id),
            _ => None,
        }
    }

    /// The property this accessor belongs to, if any.
    pub fn property(self) -> Option<PropertyId> {
        match self {
            Self::PropertyGetter(id) | Self::PropertySetter(id) => Some(id),
            _ => None,
        }
    }
}

/// Reflection data for one faked member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    id: MethodId,
    declaring_type: String,
    name: String,
    params: Vec<ParamInfo>,
    return_type: TypeTag,
    kind: MethodKind,
}

impl MethodInfo {
    /// Starts describing an ordinary method.
    pub fn builder(declaring_type: impl Into<String>, name: impl Into<String>) -> MethodBuilder {
        MethodBuilder {
            declaring_type: declaring_type.into(),
            name: name.into(),
            params: Vec::new(),
            return_type: TypeTag::Unit,
            kind: MethodKind::Ordinary,
        }
    }

    /// Getter of `property` returning `ty`.
    pub fn getter(declaring_type: &str, property: &str, ty: TypeTag) -> Arc<Self> {
        let id = make_property_id(declaring_type, property);
        Self::builder(declaring_type, format!("get_{property}"))
            .returns(ty)
            .kind(MethodKind::PropertyGetter(id))
            .build()
    }

    /// Setter of `property` accepting `ty`.
    pub fn setter(declaring_type: &str, property: &str, ty: TypeTag) -> Arc<Self> {
        let id = make_property_id(declaring_type, property);
        Self::builder(declaring_type, format!("set_{property}"))
            .param("value", ty)
            .kind(MethodKind::PropertySetter(id))
            .build()
    }

    /// Add accessor of `event`.
    pub fn event_add(declaring_type: &str, event: &str) -> Arc<Self> {
        let id = make_event_id(declaring_type, event);
        Self::builder(declaring_type, format!("add_{event}"))
            .param("handler", TypeTag::Handler)
            .kind(MethodKind::EventAdd(id))
            .build()
    }

    /// Remove accessor of `event`.
    pub fn event_remove(declaring_type: &str, event: &str) -> Arc<Self> {
        let id = make_event_id(declaring_type, event);
        Self::builder(declaring_type, format!("remove_{event}"))
            .param("handler", TypeTag::Handler)
            .kind(MethodKind::EventRemove(id))
            .build()
    }

    /// `Equals(other)` on `declaring_type`.
    pub fn equals(declaring_type: &str) -> Arc<Self> {
        Self::builder(declaring_type, "Equals")
            .param("other", TypeTag::object("object"))
            .returns(TypeTag::Bool)
            .kind(MethodKind::Equals)
            .build()
    }

    /// `GetHashCode()` on `declaring_type`.
    pub fn hash_code(declaring_type: &str) -> Arc<Self> {
        Self::builder(declaring_type, "GetHashCode")
            .returns(TypeTag::Int)
            .kind(MethodKind::HashCode)
            .build()
    }

    /// `ToString()` on `declaring_type`.
    pub fn to_string_member(declaring_type: &str) -> Arc<Self> {
        Self::builder(declaring_type, "ToString")
            .returns(TypeTag::Str)
            .kind(MethodKind::ToString)
            .build()
    }

    /// Stable identifier.
    pub fn id(&self) -> MethodId {
        self.id
    }

    /// Name of the declaring (faked) type.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in order.
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Declared return type.
    pub fn return_type(&self) -> &TypeTag {
        &self.return_type
    }

    /// Structural role.
    pub fn kind(&self) -> MethodKind {
        self.kind
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Builder for [`MethodInfo`].
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    declaring_type: String,
    name: String,
    params: Vec<ParamInfo>,
    return_type: TypeTag,
    kind: MethodKind,
}

impl MethodBuilder {
    /// Appends a by-value parameter.
    pub fn param(self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.param_with_mode(name, ty, ParamMode::In)
    }

    /// Appends a by-reference parameter.
    pub fn ref_param(self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.param_with_mode(name, ty, ParamMode::Ref)
    }

    /// Appends an output parameter.
    pub fn out_param(self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.param_with_mode(name, ty, ParamMode::Out)
    }

    fn param_with_mode(mut self, name: impl Into<String>, ty: TypeTag, mode: ParamMode) -> Self {
        self.params.push(ParamInfo {
            name: name.into(),
            ty,
            mode,
        });
        self
    }

    /// Sets the return type (default [`TypeTag::Unit`]).
    pub fn returns(mut self, ty: TypeTag) -> Self {
        self.return_type = ty;
        self
    }

    /// Sets the structural role (default [`MethodKind::Ordinary`]).
    pub fn kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    /// Finishes the description and derives the method id from the signature.
    pub fn build(self) -> Arc<MethodInfo> {
        let id = make_method_id(&self.signature());
        Arc::new(MethodInfo {
            id,
            declaring_type: self.declaring_type,
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            kind: self.kind,
        })
    }

    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match p.mode {
                ParamMode::In => p.ty.label().to_owned(),
                ParamMode::Ref => format!("ref {}", p.ty.label()),
                ParamMode::Out => format!("out {}", p.ty.label()),
            })
            .collect();
        format!(
            "{}::{}({}) -> {}",
            self.declaring_type,
            self.name,
            params.join(", "),
            self.return_type.label()
        )
    }
}
