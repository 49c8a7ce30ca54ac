// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic sequence source.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use mimic_core::{SequenceNumber, SequenceSource};

/// Hands out `start, start + step, start + 2 * step, ...` and counts draws.
#[derive(Debug)]
pub struct SteppedSequence {
    next: AtomicU64,
    step: u64,
    draws: AtomicUsize,
}

impl SteppedSequence {
    /// A source starting at `start` (zero is bumped to one), advancing by
    /// `step` (zero is bumped to one).
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
            step: step.max(1),
            draws: AtomicUsize::new(0),
        }
    }

    /// How many numbers have been drawn.
    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::Acquire)
    }
}

impl SequenceSource for SteppedSequence {
    fn next(&self) -> SequenceNumber {
        self.draws.fetch_add(1, Ordering::AcqRel);
        SequenceNumber::from_raw(self.next.fetch_add(self.step, Ordering::AcqRel))
    }
}
