// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Association from faked instances to their managers.

use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use rustc_hash::FxHashMap;

use crate::manager::FakeManager;

struct Registration {
    object: Weak<dyn Any + Send + Sync>,
    manager: Arc<FakeManager>,
}

/// Weak-keyed map from a faked instance to its manager.
///
/// Keys are allocation addresses; an entry whose instance has been dropped is
/// stale and is purged on the next insertion, so a reused address never
/// resolves to the old manager.
#[derive(Default)]
pub(crate) struct ManagerRegistry {
    entries: Mutex<FxHashMap<usize, Registration>>,
}

fn address(object: &Arc<dyn Any + Send + Sync>) -> usize {
    Arc::as_ptr(object).cast::<()>().addr()
}

impl ManagerRegistry {
    pub(crate) fn get(&self, object: &Arc<dyn Any + Send + Sync>) -> Option<Arc<FakeManager>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&address(object))
            .filter(|r| r.object.upgrade().is_some_and(|live| Arc::ptr_eq(&live, object)))
            .map(|r| Arc::clone(&r.manager))
    }

    /// Registers `manager` for `object`. Returns `false` (and leaves the
    /// registry unchanged) when the object already has a live manager.
    pub(crate) fn insert(&self, object: &Arc<dyn Any + Send + Sync>, manager: Arc<FakeManager>) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, r| r.object.strong_count() > 0);
        let key = address(object);
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(
            key,
            Registration {
                object: Arc::downgrade(object),
                manager,
            },
        );
        true
    }

    pub(crate) fn len(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, r| r.object.strong_count() > 0);
        entries.len()
    }
}

impl std::fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("ManagerRegistry").field("entries", &count).finish()
    }
}
