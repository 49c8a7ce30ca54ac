// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Global call sequencing.
//!
//! Every recorded call, on every fake of a context, draws a number from one
//! shared [`SequenceSource`]. The numbers give a strict total order across
//! fakes, which is what cross-fake ordering assertions compare.

use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a call in the cross-fake timeline.
///
/// # Invariants
/// - Zero is reserved as "no call yet"; sources never hand it out.
/// - Numbers from one source are unique and strictly increasing in the order
///   they were drawn.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// Constructs a `SequenceNumber` from a raw `u64` value.
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

impl core::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of sequence numbers shared by every fake of a context.
///
/// Injected through [`crate::FakeContextBuilder::sequence_source`] so tests can
/// substitute a deterministic or instrumented source.
pub trait SequenceSource: Send + Sync {
    /// Draws the next number. Must be atomic and never repeat a value.
    fn next(&self) -> SequenceNumber;
}

/// Default lock-free sequence source: an atomic counter.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    /// A counter whose first number is `1`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A counter whose first number is `first` (zero is bumped to one).
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }

    /// The number the next call to [`SequenceSource::next`] will return.
    pub fn peek(&self) -> SequenceNumber {
        SequenceNumber(self.next.load(Ordering::Acquire))
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceSource for SequenceAllocator {
    fn next(&self) -> SequenceNumber {
        SequenceNumber(self.next.fetch_add(1, Ordering::AcqRel))
    }
}

/// Highest sequence number a single fake has recorded.
///
/// Updated on the call hot path by concurrent recorders, so it uses a
/// compare-and-retry loop rather than a lock or a plain store: a slower thread
/// holding an older number must never overwrite a newer one.
#[derive(Debug, Default)]
pub struct LastSequence {
    value: AtomicU64,
}

impl LastSequence {
    /// No calls recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the stored value to `seq` if `seq` is newer.
    pub fn observe(&self, seq: SequenceNumber) {
        let mut current = self.value.load(Ordering::Acquire);
        while seq.0 > current {
            match self.value.compare_exchange_weak(
                current,
                seq.0,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// The highest recorded number, or `None` before the first call.
    pub fn get(&self) -> Option<SequenceNumber> {
        match self.value.load(Ordering::Acquire) {
            0 => None,
            raw => Some(SequenceNumber(raw)),
        }
    }

    /// Overwrites the stored value; used by snapshot restore.
    pub(crate) fn reset_to(&self, seq: Option<SequenceNumber>) {
        self.value
            .store(seq.map_or(0, SequenceNumber::value), Ordering::Release);
    }
}
