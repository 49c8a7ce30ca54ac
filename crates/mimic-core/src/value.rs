// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dynamically typed argument and return values.
//!
//! The interception point converts native arguments into [`Value`]s before
//! handing a call to the engine, and converts the return slot back afterwards.
//! Reference-like values (objects, tokens, handlers) compare by identity.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::FakeError;

/// Static type of a parameter or return slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// No value (`()`).
    Unit,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// Floating point number.
    Float,
    /// UTF-8 string.
    Str,
    /// Homogeneous list.
    List,
    /// Reference to an object of the named type.
    Object(String),
    /// Cancellation token.
    Token,
    /// Event handler.
    Handler,
}

impl TypeTag {
    /// Shorthand for [`TypeTag::Object`].
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// The type's zero value: what an unconfigured slot holds.
    ///
    /// Reference types (objects, handlers) are [`Value::Null`]; a token's zero
    /// value is a token that is never canceled.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Unit => Value::Unit,
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::UInt => Value::UInt(0),
            Self::Float => Value::Float(0.0),
            Self::Str => Value::Str(String::new()),
            Self::List => Value::List(Vec::new()),
            Self::Object(_) | Self::Handler => Value::Null,
            Self::Token => Value::Token(CancellationToken::new()),
        }
    }

    /// Canonical label used when hashing method signatures.
    pub fn label(&self) -> &str {
        match self {
            Self::Unit => "unit",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Object(name) => name,
            Self::Token => "token",
            Self::Handler => "handler",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A dynamically typed argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The unit value.
    Unit,
    /// Absence of a reference.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// List of values.
    List(Vec<Value>),
    /// Object reference (identity equality).
    Object(ObjectRef),
    /// Cancellation token (identity equality).
    Token(CancellationToken),
    /// Event handler (identity equality).
    Handler(EventHandler),
    /// Request to raise an event, passed where a handler is expected.
    Raise(EventRaise),
}

impl Value {
    /// Shorthand for [`Value::Str`].
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the object reference, if any.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "\"{v}\""),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Self::Token(token) => {
                if token.is_cancellation_requested() {
                    f.write_str("<canceled token>")
                } else {
                    f.write_str("<token>")
                }
            }
            Self::Handler(_) => f.write_str("<handler>"),
            Self::Raise(raise) => write!(f, "<raise with {} argument(s)>", raise.arguments().len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Shared reference to an arbitrary object, compared by pointer identity.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ObjectRef {
    /// Wraps a shared object.
    pub fn new<T>(object: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: object,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Rust type name of the referenced object.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Address of the referenced object, used for identity checks.
    pub fn addr(&self) -> *const () {
        Arc::as_ptr(&self.inner).cast::<()>()
    }

    /// Returns the object as `T` if it has that type.
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// The type-erased object.
    pub fn as_any(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.inner
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:p})", self.type_name, self.addr())
    }
}

/// Cooperative cancellation flag passed as a call argument.
///
/// Clones share the flag; equality is identity of the shared flag.
#[derive(Clone, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is already canceled.
    pub fn canceled() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancellation_requested(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

impl PartialEq for CancellationToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.canceled, &other.canceled)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("canceled", &self.is_cancellation_requested())
            .finish()
    }
}

/// Callback signature of an event handler.
pub type HandlerFn = dyn Fn(&[Value]) -> Result<(), FakeError> + Send + Sync;

/// Subscribable event handler, compared by identity.
#[derive(Clone)]
pub struct EventHandler {
    callback: Arc<HandlerFn>,
}

impl EventHandler {
    /// Wraps a handler callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), FakeError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Invokes the handler.
    pub fn invoke(&self, arguments: &[Value]) -> Result<(), FakeError> {
        (self.callback)(arguments)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Arc::as_ptr(&self.callback).cast::<()>())
    }
}

/// Marker value that raises an event when passed to the event's add accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRaise {
    arguments: Vec<Value>,
}

impl EventRaise {
    /// Raise with the given handler arguments.
    pub fn with(arguments: Vec<Value>) -> Self {
        Self { arguments }
    }

    /// Arguments handed to every subscribed handler.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}
