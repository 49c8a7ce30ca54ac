// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The injected root: shared services and fake creation.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::assert::CallAsserter;
use crate::config::FakeOptions;
use crate::dummy::{DefaultDummyFactory, DummyFactory};
use crate::error::FakeError;
use crate::format::{CallFormatter, PlainCallFormatter};
use crate::manager::{FakeId, FakeManager};
use crate::record::CompletedCall;
use crate::registry::ManagerRegistry;
use crate::rules::{CallMatcher, ConfiguredRule, WrappedObjectRule};
use crate::scope::{FakeScope, ScopeStack};
use crate::sequence::{SequenceAllocator, SequenceSource};
use crate::sequential::SequentialCallContext;

/// Services every manager of a context shares.
pub(crate) struct ContextServices {
    pub(crate) sequence: Arc<dyn SequenceSource>,
    pub(crate) scopes: Arc<ScopeStack>,
    pub(crate) dummies: Arc<dyn DummyFactory>,
    pub(crate) formatter: Arc<dyn CallFormatter>,
    next_fake_id: AtomicU64,
}

impl fmt::Debug for ContextServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextServices")
            .field("scope_depth", &self.scopes.depth())
            .finish_non_exhaustive()
    }
}

/// Root object of the engine: owns the sequence source, the scope stack, the
/// manager registry, the dummy factory and the call formatter.
///
/// Cheap to clone; clones share everything. Fakes created by different
/// contexts never share sequence numbers or scopes.
#[derive(Clone, Debug)]
pub struct FakeContext {
    services: Arc<ContextServices>,
    registry: Arc<ManagerRegistry>,
}

impl Default for FakeContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FakeContext {
    /// A context with the default services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts configuring a context.
    pub fn builder() -> FakeContextBuilder {
        FakeContextBuilder::default()
    }

    pub(crate) fn services(&self) -> &Arc<ContextServices> {
        &self.services
    }

    /// Creates the manager for `object`, applies `options`, and captures the
    /// baseline state.
    ///
    /// # Errors
    /// - [`FakeError::Configuration`] when `object` is already faked.
    /// - Any error returned by a configuration callback in `options`.
    pub fn create_fake<T>(
        &self,
        object: &Arc<T>,
        type_name: &str,
        options: FakeOptions,
    ) -> Result<Arc<FakeManager>, FakeError>
    where
        T: Any + Send + Sync,
    {
        let erased: Arc<dyn Any + Send + Sync> = Arc::<T>::clone(object);
        if self.registry.get(&erased).is_some() {
            return Err(FakeError::Configuration(format!(
                "this {type_name} instance is already faked"
            )));
        }
        let id = FakeId::from_raw(self.services.next_fake_id.fetch_add(1, Ordering::Relaxed));
        let manager = FakeManager::new(
            id,
            type_name,
            options.name.as_deref(),
            Arc::downgrade(&erased),
            Arc::clone(&self.services),
        );

        if let Some(target) = options.wrapping.clone() {
            manager.insert_untracked_last(Arc::new(WrappedObjectRule::new(target)));
        }
        if options.call_base_methods {
            manager.insert_untracked_last(
                ConfiguredRule::builder(CallMatcher::any_call())
                    .calls_base_method()
                    .build(),
            );
        }
        if let Some(strict) = options.strict {
            manager.make_strict(strict);
        }
        manager.without_scope_tracking(|| {
            options
                .configure
                .iter()
                .try_for_each(|configure| configure(manager.as_ref()))
        })?;

        manager.capture_state();
        if !self.registry.insert(&erased, Arc::clone(&manager)) {
            return Err(FakeError::Configuration(format!(
                "this {type_name} instance is already faked"
            )));
        }
        debug!(
            fake = %id,
            type_name,
            strict = options.strict.is_some(),
            rules = manager.rules().len(),
            "fake created"
        );
        Ok(manager)
    }

    /// The manager of `object`, if it was faked by this context.
    pub fn manager_for<T>(&self, object: &Arc<T>) -> Option<Arc<FakeManager>>
    where
        T: Any + Send + Sync,
    {
        let erased: Arc<dyn Any + Send + Sync> = Arc::<T>::clone(object);
        self.registry.get(&erased)
    }

    /// Number of live fakes created by this context.
    pub fn fake_count(&self) -> usize {
        self.registry.len()
    }

    /// Opens a nested scope; closing it undoes the rules added inside it.
    pub fn create_scope(&self) -> FakeScope {
        FakeScope::open(Arc::clone(&self.services.scopes))
    }

    /// Calls on `manager` visible from the innermost open scope (the whole
    /// ledger when no scope is open).
    pub fn calls_within_current_scope(&self, manager: &FakeManager) -> Vec<Arc<CompletedCall>> {
        self.services.scopes.current().calls_for(manager)
    }

    /// A fresh cursor for ordered assertions across fakes.
    pub fn sequential(&self) -> SequentialCallContext {
        SequentialCallContext::new(Arc::clone(&self.services.formatter))
    }

    /// Call-count assertions over the current scope.
    pub fn asserter(&self) -> CallAsserter {
        CallAsserter::new(
            Arc::clone(&self.services.scopes),
            Arc::clone(&self.services.formatter),
        )
    }

    /// The formatter used in diagnostics.
    pub fn formatter(&self) -> &Arc<dyn CallFormatter> {
        &self.services.formatter
    }
}

/// Builder for [`FakeContext`].
#[must_use]
#[derive(Default)]
pub struct FakeContextBuilder {
    sequence: Option<Arc<dyn SequenceSource>>,
    dummies: Option<Arc<dyn DummyFactory>>,
    formatter: Option<Arc<dyn CallFormatter>>,
}

impl FakeContextBuilder {
    /// Replaces the default [`SequenceAllocator`].
    pub fn sequence_source(mut self, source: Arc<dyn SequenceSource>) -> Self {
        self.sequence = Some(source);
        self
    }

    /// Replaces the default [`DefaultDummyFactory`].
    pub fn dummy_factory(mut self, factory: Arc<dyn DummyFactory>) -> Self {
        self.dummies = Some(factory);
        self
    }

    /// Replaces the default [`PlainCallFormatter`].
    pub fn formatter(mut self, formatter: Arc<dyn CallFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Finishes the context.
    pub fn build(self) -> FakeContext {
        FakeContext {
            services: Arc::new(ContextServices {
                sequence: self
                    .sequence
                    .unwrap_or_else(|| Arc::new(SequenceAllocator::new())),
                scopes: Arc::new(ScopeStack::new()),
                dummies: self
                    .dummies
                    .unwrap_or_else(|| Arc::new(DefaultDummyFactory::new())),
                formatter: self.formatter.unwrap_or_else(|| Arc::new(PlainCallFormatter)),
                next_fake_id: AtomicU64::new(1),
            }),
            registry: Arc::new(ManagerRegistry::default()),
        }
    }
}

impl fmt::Debug for FakeContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeContextBuilder")
            .field("sequence", &self.sequence.is_some())
            .field("dummies", &self.dummies.is_some())
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}
