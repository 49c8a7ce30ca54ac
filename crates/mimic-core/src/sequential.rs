// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordered assertions across fakes.

use std::fmt;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use crate::assert::{write_call_listing, Repeated};
use crate::error::FakeError;
use crate::format::CallFormatter;
use crate::manager::FakeManager;
use crate::record::CompletedCall;
use crate::rules::CallMatcher;

#[derive(Default)]
struct CursorState {
    managers: Vec<Arc<FakeManager>>,
    cursor: u64,
    asserted: Vec<String>,
}

/// Cursor over the merged, sequence-ordered call history of every fake it
/// has been asked about.
///
/// Each successful check moves the cursor past the calls it matched, so a
/// later check only sees calls that happened afterwards.
pub struct SequentialCallContext {
    formatter: Arc<dyn CallFormatter>,
    state: Mutex<CursorState>,
}

impl SequentialCallContext {
    pub(crate) fn new(formatter: Arc<dyn CallFormatter>) -> Self {
        Self {
            formatter,
            state: Mutex::new(CursorState::default()),
        }
    }

    /// Asserts that, after the previously checked calls, calls matching
    /// `predicate` happened `repeated` times.
    ///
    /// # Errors
    /// Returns [`FakeError::OrderAssertionFailed`] listing every asserted
    /// call so far and the full history in actual order.
    pub fn check_next_call<P>(
        &self,
        manager: &Arc<FakeManager>,
        predicate: P,
        description: &str,
        repeated: &Repeated,
    ) -> Result<(), FakeError>
    where
        P: Fn(&CompletedCall) -> bool,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.managers.iter().any(|m| m.id() == manager.id()) {
            state.managers.push(Arc::clone(manager));
        }
        state
            .asserted
            .push(format!("{}: {description} repeated {repeated}", manager.display_name()));

        let mut history: Vec<Arc<CompletedCall>> = state
            .managers
            .iter()
            .flat_map(|m| m.recorded_calls())
            .collect();
        history.sort_by_key(|c| c.sequence_number());

        let mut matched = 0_usize;
        for call in &history {
            let seq = call.sequence_number().value();
            if seq > state.cursor && call.fake() == manager.id() && predicate(call) {
                matched += 1;
                state.cursor = seq;
                if repeated.is_satisfied_by(matched) {
                    return Ok(());
                }
            }
        }
        if matched == 0 && repeated.is_satisfied_by(0) {
            return Ok(());
        }

        let mut message = String::from("\n  Assertion failed for the following calls:\n");
        for asserted in &state.asserted {
            let _ = writeln!(message, "    {asserted}");
        }
        message.push_str("  The calls were found but not in the correct order among the calls:\n");
        write_call_listing(&mut message, self.formatter.as_ref(), &history);
        Err(FakeError::OrderAssertionFailed(message))
    }

    /// [`SequentialCallContext::check_next_call`] with a [`CallMatcher`].
    ///
    /// # Errors
    /// See [`SequentialCallContext::check_next_call`].
    pub fn check_next_call_matching(
        &self,
        manager: &Arc<FakeManager>,
        matcher: &CallMatcher,
        repeated: &Repeated,
    ) -> Result<(), FakeError> {
        self.check_next_call(
            manager,
            |call| matcher.matches_record(call),
            &matcher.describe(),
            repeated,
        )
    }
}

impl fmt::Debug for SequentialCallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SequentialCallContext")
            .field("fakes", &state.managers.len())
            .field("cursor", &state.cursor)
            .finish_non_exhaustive()
    }
}
