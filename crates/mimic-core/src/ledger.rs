// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-fake append-only call ledger.

use std::sync::{Arc, PoisonError, RwLock};

use crate::record::CompletedCall;
use crate::sequence::{SequenceNumber, SequenceSource};

/// Append-only, concurrently writable list of a fake's calls.
///
/// Writers hold the lock only long enough to draw a sequence number and push
/// the record, so per-fake insertion order equals sequence order. Readers get
/// a copy of the list as of some instant: the old or the new state, never a
/// torn entry. The ledger lock is separate from the fake's rule-chain lock.
#[derive(Debug, Default)]
pub struct CallLedger {
    calls: RwLock<Vec<Arc<CompletedCall>>>,
}

impl CallLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a sequence number from `source`, builds the record with it and
    /// appends it, atomically with respect to other appends.
    pub fn append_with<F>(&self, source: &dyn SequenceSource, make: F) -> Arc<CompletedCall>
    where
        F: FnOnce(SequenceNumber) -> CompletedCall,
    {
        let mut calls = self.calls.write().unwrap_or_else(PoisonError::into_inner);
        let record = Arc::new(make(source.next()));
        calls.push(Arc::clone(&record));
        record
    }

    /// Copy of all records in sequence order.
    pub fn snapshot(&self) -> Vec<Arc<CompletedCall>> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records with a sequence number at or below `last`.
    pub fn up_to(&self, last: SequenceNumber) -> Vec<Arc<CompletedCall>> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .take_while(|c| c.sequence_number() <= last)
            .cloned()
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the contents wholesale; used by snapshot restore.
    pub(crate) fn replace(&self, calls: Vec<Arc<CompletedCall>>) {
        *self.calls.write().unwrap_or_else(PoisonError::into_inner) = calls;
    }
}
