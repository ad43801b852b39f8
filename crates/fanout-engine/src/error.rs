//! Error types for reconcile passes.

use fanout_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by a reconcile pass or an orphan sweep.
///
/// A returned error means the pass aborted and should be retried wholesale
/// by the dispatcher; side effects already committed are not rolled back.
/// Best-effort conditions (individual deletion failures) are logged, not
/// returned — with one exception: the last deletion error of the
/// expiration loop is handed back so the dispatcher schedules a retry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The shared store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The pause-label propagator refused the parent.
    #[error("Pause propagation failed: {message}")]
    Pause {
        /// Description of the propagation failure.
        message: String,
    },

    /// The rolling-update mutator failed.
    #[error("Rollout mutation failed: {message}")]
    Rollout {
        /// Description of the mutation failure.
        message: String,
    },

    /// The placement collaborator could not resolve the target cluster set.
    #[error("Placement resolution failed: {message}")]
    Placement {
        /// Description of the resolution failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a new `Pause` error.
    #[must_use]
    pub fn pause(message: impl Into<String>) -> Self {
        Self::Pause {
            message: message.into(),
        }
    }

    /// Creates a new `Rollout` error.
    #[must_use]
    pub fn rollout(message: impl Into<String>) -> Self {
        Self::Rollout {
            message: message.into(),
        }
    }

    /// Creates a new `Placement` error.
    #[must_use]
    pub fn placement(message: impl Into<String>) -> Self {
        Self::Placement {
            message: message.into(),
        }
    }

    /// Returns `true` if this wraps a store error.
    #[must_use]
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
