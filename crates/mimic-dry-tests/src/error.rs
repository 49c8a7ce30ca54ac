// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type for raised-error fixtures.

use mimic_core::FakeError;
use thiserror::Error;

/// Errors test rules raise through [`FakeError::Raised`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestError {
    /// Generic failure with a label.
    #[error("test failure: {0}")]
    Failure(String),
    /// Simulated I/O-style failure.
    #[error("device unavailable")]
    Unavailable,
}

impl TestError {
    /// A [`TestError::Failure`] wrapped as a raised [`FakeError`].
    pub fn raised(label: &str) -> FakeError {
        FakeError::raised(Self::Failure(label.to_owned()))
    }
}
