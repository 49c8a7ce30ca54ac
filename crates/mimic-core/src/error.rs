// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for call dispatch, configuration and assertions.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Shared, type-erased error carried by [`FakeError::Raised`].
pub type RaisedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors surfaced by the dispatch engine.
///
/// None of these are retried. Configuration mistakes surface to the configuring
/// caller; everything else surfaces to the code that triggered the faked call
/// (or the assertion).
#[derive(Debug, Clone, Error)]
pub enum FakeError {
    /// An invalid chain or lifecycle operation, e.g. inserting after a rule
    /// that is no longer in the chain.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A strict fake received a call that no user rule handles.
    #[error("call to unconfigured method of strict fake: {call}")]
    UnexpectedCall {
        /// Formatted description of the offending call.
        call: String,
    },
    /// An error a rule was configured to raise.
    ///
    /// The payload is the original error, not a wrapper; use
    /// [`FakeError::raised_ref`] to get it back as its concrete type.
    #[error("{0}")]
    Raised(RaisedError),
    /// The call received a cancellation token that was already canceled.
    #[error("the operation was canceled: {method}")]
    OperationCanceled {
        /// Display name of the canceled method.
        method: String,
    },
    /// A rule asked for the base implementation but the interception point
    /// did not supply one.
    #[error("no base implementation available for {method}")]
    NoBaseImplementation {
        /// Display name of the method.
        method: String,
    },
    /// A call-count assertion failed.
    #[error("{0}")]
    ExpectationFailed(String),
    /// An ordered (sequential) assertion failed.
    #[error("{0}")]
    OrderAssertionFailed(String),
}

impl FakeError {
    /// Wraps an arbitrary error so a rule can raise it.
    pub fn raised<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Raised(Arc::new(error))
    }

    /// Returns the raised error as `E` when this is a [`FakeError::Raised`]
    /// holding that type.
    pub fn raised_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Raised(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` for the two assertion-failure variants.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            Self::ExpectationFailed(_) | Self::OrderAssertionFailed(_)
        )
    }
}
