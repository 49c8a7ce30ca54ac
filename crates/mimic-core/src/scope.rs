// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Nestable configuration scopes.
//!
//! A [`FakeScope`] tracks the rules added through the public `add_rule_*`
//! methods while it is current, and removes exactly those entries (by
//! identity) when it is closed. It also collects the calls recorded while it
//! or any scope nested in it was current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::manager::{FakeId, FakeManager};
use crate::record::CompletedCall;
use crate::rule::RuleEntry;

type TrackedRule = (Weak<FakeManager>, Arc<RuleEntry>);

/// Bookkeeping of one scope. The root frame has no parent, records nothing
/// and tracks nothing.
#[derive(Debug)]
pub(crate) struct ScopeFrame {
    id: u64,
    parent: Option<Arc<ScopeFrame>>,
    calls: Mutex<FxHashMap<FakeId, Vec<Arc<CompletedCall>>>>,
    added_rules: Mutex<Vec<TrackedRule>>,
}

impl ScopeFrame {
    fn new(id: u64, parent: Option<Arc<Self>>) -> Self {
        Self {
            id,
            parent,
            calls: Mutex::new(FxHashMap::default()),
            added_rules: Mutex::new(Vec::new()),
        }
    }

    fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Records `call` here and in every non-root ancestor.
    pub(crate) fn record_call(&self, fake: FakeId, call: &Arc<CompletedCall>) {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if current.is_root() {
                break;
            }
            current
                .calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(fake)
                .or_default()
                .push(Arc::clone(call));
            frame = current.parent.as_deref();
        }
    }

    pub(crate) fn track_rule(&self, manager: Weak<FakeManager>, entry: Arc<RuleEntry>) {
        if self.is_root() {
            return;
        }
        self.added_rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((manager, entry));
    }

    /// Calls made on `manager` while this frame (or a descendant) was
    /// current, in sequence order. The root frame answers with the whole
    /// ledger.
    pub(crate) fn calls_for(&self, manager: &FakeManager) -> Vec<Arc<CompletedCall>> {
        if self.is_root() {
            return manager.recorded_calls();
        }
        let mut calls = self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&manager.id())
            .cloned()
            .unwrap_or_default();
        calls.sort_by_key(|c| c.sequence_number());
        calls
    }

    fn unwind(&self) -> usize {
        let tracked = std::mem::take(&mut *self.added_rules.lock().unwrap_or_else(PoisonError::into_inner));
        let count = tracked.len();
        for (manager, entry) in tracked.into_iter().rev() {
            if let Some(manager) = manager.upgrade() {
                manager.remove_entry(&entry);
            }
        }
        count
    }
}

/// Stack of active scopes shared by every fake of a context.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: Mutex<Vec<Arc<ScopeFrame>>>,
    next_id: AtomicU64,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        Self {
            frames: Mutex::new(vec![Arc::new(ScopeFrame::new(0, None))]),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn current(&self) -> Arc<ScopeFrame> {
        let frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        frames
            .last()
            .map_or_else(|| Arc::new(ScopeFrame::new(0, None)), Arc::clone)
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self) -> Arc<ScopeFrame> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        let parent = frames.last().map(Arc::clone);
        let frame = Arc::new(ScopeFrame::new(id, parent));
        frames.push(Arc::clone(&frame));
        frame
    }

    /// Removes `frame` from the stack. Returns `false` when it was not the
    /// innermost scope (it is removed anyway).
    fn pop(&self, frame: &Arc<ScopeFrame>) -> bool {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        match frames.iter().rposition(|f| Arc::ptr_eq(f, frame)) {
            Some(pos) if pos + 1 == frames.len() => {
                frames.pop();
                true
            }
            Some(pos) => {
                frames.remove(pos);
                false
            }
            None => false,
        }
    }
}

/// RAII guard of an active scope.
///
/// Closing (or dropping) the guard makes the parent scope current again and
/// removes every rule entry added through the public chain methods while this
/// scope was current. Scopes must be closed in LIFO order.
#[must_use = "dropping a scope closes it immediately"]
#[derive(Debug)]
pub struct FakeScope {
    stack: Arc<ScopeStack>,
    frame: Arc<ScopeFrame>,
    closed: bool,
}

impl FakeScope {
    pub(crate) fn open(stack: Arc<ScopeStack>) -> Self {
        let frame = stack.push();
        debug!(scope = frame.id, depth = stack.depth(), "scope opened");
        Self {
            stack,
            frame,
            closed: false,
        }
    }

    /// Identifier of this scope, unique within its context.
    pub fn id(&self) -> u64 {
        self.frame.id
    }

    /// Calls made on `manager` while this scope or a nested one was current.
    pub fn calls_within_scope(&self, manager: &FakeManager) -> Vec<Arc<CompletedCall>> {
        self.frame.calls_for(manager)
    }

    /// Closes the scope. Equivalent to dropping it.
    pub fn close(self) {
        drop(self);
    }

    fn dispose(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let was_innermost = self.stack.pop(&self.frame);
        if !was_innermost {
            warn!(scope = self.frame.id, "scope closed out of order");
        }
        let removed = self.frame.unwind();
        debug!(scope = self.frame.id, removed, "scope closed");
        debug_assert!(
            was_innermost || std::thread::panicking(),
            "scopes must be closed in LIFO order"
        );
    }
}

impl Drop for FakeScope {
    fn drop(&mut self) {
        self.dispose();
    }
}
