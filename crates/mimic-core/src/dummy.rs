// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dummy values for unconfigured return slots.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::value::{TypeTag, Value};

/// Produces placeholder values for unconfigured calls.
pub trait DummyFactory: Send + Sync {
    /// A dummy of type `ty`, or `None` to fall back to the zero value.
    fn try_create(&self, ty: &TypeTag) -> Option<Value>;
}

/// Producer registered for one object type.
pub type DummyProducer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default factory: per-object-type producers, zero values for everything else.
///
/// Clones share the registry.
#[derive(Clone, Default)]
pub struct DefaultDummyFactory {
    producers: Arc<RwLock<HashMap<String, DummyProducer>>>,
}

impl DefaultDummyFactory {
    /// A factory with no registered producers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a producer for the object type named `type_name`.
    pub fn register<F>(&self, type_name: impl Into<String>, producer: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.producers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(type_name.into(), Arc::new(producer));
    }
}

impl DummyFactory for DefaultDummyFactory {
    fn try_create(&self, ty: &TypeTag) -> Option<Value> {
        if let TypeTag::Object(name) = ty {
            let producer = self
                .producers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned();
            if let Some(producer) = producer {
                return Some(producer());
            }
        }
        Some(ty.zero_value())
    }
}

impl std::fmt::Debug for DefaultDummyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .producers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("DefaultDummyFactory")
            .field("producers", &count)
            .finish()
    }
}
