// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-fake orchestration: rule chain, ledger, events, listeners.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::{debug, trace};

use crate::call::InterceptedCall;
use crate::config::StrictOptions;
use crate::context::ContextServices;
use crate::error::FakeError;
use crate::events::{invoke_all, EventRegistry};
use crate::ledger::CallLedger;
use crate::listener::InterceptionListener;
use crate::method::EventId;
use crate::record::CompletedCall;
use crate::rule::{CallRule, RuleEntry, RuleHandle};
use crate::rules::{BuiltInRule, StrictRule};
use crate::sequence::{LastSequence, SequenceNumber};
use crate::snapshot::ManagerSnapshot;
use crate::value::{EventHandler, ObjectRef, TypeTag, Value};

/// Identifier of a faked instance, unique within its context.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FakeId(u64);

impl FakeId {
    /// Constructs a `FakeId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fake#{}", self.0)
    }
}

#[derive(Default)]
struct ManagerState {
    rules: Vec<Arc<RuleEntry>>,
    events: EventRegistry,
    listeners: Vec<Arc<dyn InterceptionListener>>,
}

enum Selected {
    User(Arc<dyn CallRule>),
    BuiltIn(BuiltInRule),
}

/// Finalizes the record and runs "after" listeners when dropped, so both
/// happen even if the applied rule failed or panicked.
struct CompletionGuard<'a> {
    call: &'a mut InterceptedCall,
    record: &'a CompletedCall,
    listeners: &'a [Arc<dyn InterceptionListener>],
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.record.finish(self.call);
        for listener in self.listeners.iter().rev() {
            listener.on_after_call_intercepted(self.record);
        }
    }
}

/// Puts the scope-tracking flag back when dropped.
struct TrackingGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl Drop for TrackingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::Release);
    }
}

/// The dispatch engine of one faked instance.
///
/// Invariants
/// - The chain, event registry and listener list are guarded by one mutex,
///   held only for selection and mutation, never while a rule applies.
/// - Every call passed to [`FakeManager::process`] produces exactly one
///   ledger record, whatever the rule did.
/// - A strict fake's rejection rule lives outside the chain and is consulted
///   only when no chain entry claims the call, ahead of the fallbacks.
/// - The manager holds the faked instance weakly.
pub struct FakeManager {
    id: FakeId,
    type_name: String,
    display_name: String,
    record_name: Arc<str>,
    object: Weak<dyn Any + Send + Sync>,
    services: Arc<ContextServices>,
    state: Mutex<ManagerState>,
    ledger: CallLedger,
    last_sequence: LastSequence,
    baseline: Mutex<Option<ManagerSnapshot>>,
    strict: OnceLock<Arc<StrictRule>>,
    scope_tracking: AtomicBool,
    this: Weak<FakeManager>,
}

impl FakeManager {
    pub(crate) fn new(
        id: FakeId,
        type_name: &str,
        name: Option<&str>,
        object: Weak<dyn Any + Send + Sync>,
        services: Arc<ContextServices>,
    ) -> Arc<Self> {
        let display_name = name.map_or_else(|| format!("Faked {type_name}"), str::to_owned);
        Arc::new_cyclic(|this| Self {
            id,
            type_name: type_name.to_owned(),
            record_name: Arc::from(display_name.as_str()),
            display_name,
            object,
            services,
            state: Mutex::new(ManagerState::default()),
            ledger: CallLedger::new(),
            last_sequence: LastSequence::new(),
            baseline: Mutex::new(None),
            strict: OnceLock::new(),
            scope_tracking: AtomicBool::new(true),
            this: this.clone(),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identifier of this fake.
    pub fn id(&self) -> FakeId {
        self.id
    }

    /// Name of the faked type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The configured name, or `Faked <type>`.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The faked instance, while it is alive.
    pub fn object(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.object.upgrade()
    }

    pub(crate) fn is_faked_object(&self, other: &ObjectRef) -> bool {
        self.object
            .upgrade()
            .is_some_and(|object| Arc::as_ptr(&object).cast::<()>() == other.addr())
    }

    /// Processes one intercepted call: records it, applies exactly one rule,
    /// and finalizes the record.
    ///
    /// # Errors
    /// Returns whatever error the applied rule produced, unchanged. The call
    /// is recorded and every "after" listener runs in either case.
    pub fn process(&self, call: &mut InterceptedCall) -> Result<(), FakeError> {
        let listeners = self.lock_state().listeners.clone();
        for listener in &listeners {
            listener.on_before_call_intercepted(call);
        }

        let record = self.ledger.append_with(self.services.sequence.as_ref(), |seq| {
            CompletedCall::begin(seq, self.id, Arc::clone(&self.record_name), &*call)
        });
        self.last_sequence.observe(record.sequence_number());
        self.services.scopes.current().record_call(self.id, &record);

        let mut guard = CompletionGuard {
            call,
            record: &record,
            listeners: &listeners,
        };
        let selected = self.select(&*guard.call);
        let outcome = match selected {
            Selected::User(rule) => {
                trace!(
                    fake = %self.id,
                    seq = %record.sequence_number(),
                    method = %record.method(),
                    rule = %rule.describe(),
                    "applying configured rule"
                );
                rule.apply(&mut *guard.call)
            }
            Selected::BuiltIn(rule) => {
                trace!(
                    fake = %self.id,
                    seq = %record.sequence_number(),
                    method = %record.method(),
                    ?rule,
                    "applying fallback rule"
                );
                rule.apply(self, &mut *guard.call)
            }
        };
        drop(guard);
        outcome
    }

    fn select(&self, call: &InterceptedCall) -> Selected {
        {
            let state = self.lock_state();
            if let Some(entry) = state
                .rules
                .iter()
                .find(|entry| !entry.is_exhausted() && entry.rule().is_applicable_to(call))
            {
                entry.record_use();
                return Selected::User(Arc::clone(entry.rule()));
            }
        }
        if let Some(strict) = self.strict.get().filter(|strict| strict.is_applicable_to(call)) {
            return Selected::User(Arc::clone(strict) as Arc<dyn CallRule>);
        }
        Selected::BuiltIn(BuiltInRule::select(call))
    }

    fn track(&self, entry: &Arc<RuleEntry>) {
        if !self.scope_tracking.load(Ordering::Acquire) {
            return;
        }
        self.services
            .scopes
            .current()
            .track_rule(self.this.clone(), Arc::clone(entry));
    }

    /// Runs `f` with scope tracking of rule additions switched off; used
    /// while a fake is configured at creation. The previous setting comes
    /// back even if `f` panics.
    pub(crate) fn without_scope_tracking<R>(&self, f: impl FnOnce() -> R) -> R {
        let _restore = TrackingGuard {
            flag: &self.scope_tracking,
            previous: self.scope_tracking.swap(false, Ordering::AcqRel),
        };
        f()
    }

    /// Turns this fake strict: calls no chain entry claims fail with
    /// [`FakeError::UnexpectedCall`] unless `options` allows them. Only the
    /// first call has an effect.
    pub(crate) fn make_strict(&self, options: StrictOptions) {
        let rule = StrictRule::new(
            options,
            self.display_name.as_str(),
            Arc::clone(&self.services.formatter),
        );
        if self.strict.set(Arc::new(rule)).is_ok() {
            debug!(fake = %self.id, "strict mode enabled");
        }
    }

    /// Whether unconfigured calls are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict.get().is_some()
    }

    /// Inserts `rule` at the front of the chain.
    pub fn add_rule_first(&self, rule: Arc<dyn CallRule>) -> RuleHandle {
        let entry = self.insert_untracked_first(rule);
        self.track(&entry);
        RuleHandle(entry)
    }

    /// Appends `rule` to the end of the chain.
    pub fn add_rule_last(&self, rule: Arc<dyn CallRule>) -> RuleHandle {
        let entry = self.insert_untracked_last(rule);
        self.track(&entry);
        RuleHandle(entry)
    }

    /// Inserts `rule` directly behind `existing`.
    ///
    /// # Errors
    /// Returns [`FakeError::Configuration`] when `existing` is not in the
    /// chain.
    pub fn add_rule_after(&self, existing: &RuleHandle, rule: Arc<dyn CallRule>) -> Result<RuleHandle, FakeError> {
        let entry = Arc::new(RuleEntry::new(rule));
        {
            let mut state = self.lock_state();
            let Some(pos) = state.rules.iter().position(|e| existing.refers_to(e)) else {
                return Err(FakeError::Configuration(format!(
                    "cannot insert after rule '{}': it is not in the chain of {}",
                    existing.rule().describe(),
                    self.display_name
                )));
            };
            state.rules.insert(pos + 1, Arc::clone(&entry));
        }
        debug!(fake = %self.id, rule = %entry.rule().describe(), "rule added after existing rule");
        self.track(&entry);
        Ok(RuleHandle(entry))
    }

    /// Removes the entry `handle` refers to. Returns `false` if it was not in
    /// the chain.
    pub fn remove_rule(&self, handle: &RuleHandle) -> bool {
        self.remove_entry(&handle.0)
    }

    pub(crate) fn remove_entry(&self, entry: &Arc<RuleEntry>) -> bool {
        let mut state = self.lock_state();
        let Some(pos) = state.rules.iter().position(|e| Arc::ptr_eq(e, entry)) else {
            return false;
        };
        state.rules.remove(pos);
        drop(state);
        debug!(fake = %self.id, rule = %entry.rule().describe(), "rule removed");
        true
    }

    pub(crate) fn insert_untracked_first(&self, rule: Arc<dyn CallRule>) -> Arc<RuleEntry> {
        let entry = Arc::new(RuleEntry::new(rule));
        self.lock_state().rules.insert(0, Arc::clone(&entry));
        debug!(fake = %self.id, rule = %entry.rule().describe(), "rule added first");
        entry
    }

    pub(crate) fn insert_untracked_last(&self, rule: Arc<dyn CallRule>) -> Arc<RuleEntry> {
        let entry = Arc::new(RuleEntry::new(rule));
        self.lock_state().rules.push(Arc::clone(&entry));
        debug!(fake = %self.id, rule = %entry.rule().describe(), "rule added last");
        entry
    }

    /// The chain, front to back, including exhausted entries.
    pub fn rules(&self) -> Vec<RuleHandle> {
        self.lock_state()
            .rules
            .iter()
            .map(|entry| RuleHandle(Arc::clone(entry)))
            .collect()
    }

    /// Registers a listener; "before" hooks run in registration order.
    pub fn add_interception_listener(&self, listener: Arc<dyn InterceptionListener>) {
        self.lock_state().listeners.push(listener);
    }

    /// Unregisters a listener by identity. Returns `false` if it was not
    /// registered.
    pub fn remove_interception_listener(&self, listener: &Arc<dyn InterceptionListener>) -> bool {
        let mut state = self.lock_state();
        match state.listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(pos) => {
                state.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Every call recorded on this fake, in sequence order.
    pub fn recorded_calls(&self) -> Vec<Arc<CompletedCall>> {
        self.ledger.snapshot()
    }

    /// Calls with a sequence number at or below `last`.
    pub fn recorded_calls_up_to(&self, last: SequenceNumber) -> Vec<Arc<CompletedCall>> {
        self.ledger.up_to(last)
    }

    /// Highest sequence number recorded on this fake.
    pub fn last_sequence_number(&self) -> Option<SequenceNumber> {
        self.last_sequence.get()
    }

    /// Invokes every handler subscribed to `event`, outside the chain lock.
    ///
    /// # Errors
    /// Returns the first handler error unchanged.
    pub fn raise_event(&self, event: EventId, arguments: &[Value]) -> Result<(), FakeError> {
        let handlers = self.event_handlers(event);
        trace!(fake = %self.id, handlers = handlers.len(), "raising event");
        invoke_all(&handlers, arguments)
    }

    /// Handlers currently subscribed to `event`.
    pub fn event_handlers(&self, event: EventId) -> Vec<EventHandler> {
        self.lock_state().events.handlers(event)
    }

    pub(crate) fn with_events<R>(&self, f: impl FnOnce(&mut EventRegistry) -> R) -> R {
        f(&mut self.lock_state().events)
    }

    pub(crate) fn dummy_for(&self, ty: &TypeTag) -> Value {
        self.services
            .dummies
            .try_create(ty)
            .unwrap_or_else(|| ty.zero_value())
    }

    /// Records the current state as the baseline [`FakeManager::restore`]
    /// returns to. Called once when the fake is created.
    pub fn capture_state(&self) {
        let snapshot = {
            let state = self.lock_state();
            ManagerSnapshot::capture(
                &state.rules,
                &state.events,
                &state.listeners,
                self.ledger.snapshot(),
                self.last_sequence.get(),
            )
        };
        debug!(fake = %self.id, rules = snapshot.rule_count(), "state captured");
        *self.baseline.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Restores the captured baseline: rules (with zeroed counters), event
    /// subscriptions, listeners, ledger and last sequence number.
    ///
    /// # Errors
    /// Returns [`FakeError::Configuration`] when no state was captured.
    pub fn restore(&self) -> Result<(), FakeError> {
        let baseline = self.baseline.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(snapshot) = baseline.as_ref() else {
            return Err(FakeError::Configuration(format!(
                "{} has no captured state to restore",
                self.display_name
            )));
        };
        let restored = snapshot.materialize();
        {
            let mut state = self.lock_state();
            state.rules = restored.rules;
            state.events = restored.events;
            state.listeners = restored.listeners;
        }
        self.ledger.replace(restored.calls);
        self.last_sequence.reset_to(restored.last_sequence);
        debug!(fake = %self.id, "state restored");
        Ok(())
    }
}

impl fmt::Debug for FakeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeManager")
            .field("id", &self.id)
            .field("name", &self.display_name)
            .field("rules", &self.lock_state().rules.len())
            .field("calls", &self.ledger.len())
            .field("strict", &self.is_strict())
            .finish_non_exhaustive()
    }
}
