//! Error types for store operations.

use std::fmt;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested workload was not found.
    #[error("Workload not found: {key}")]
    NotFound {
        /// The `namespace/name` key that was not found.
        key: String,
    },

    /// Attempted to create a workload that already exists.
    #[error("Workload already exists: {key}")]
    AlreadyExists {
        /// The `namespace/name` key that already exists.
        key: String,
    },

    /// The workload data is invalid.
    #[error("Invalid workload: {message}")]
    InvalidWorkload {
        /// Description of why the workload is invalid.
        message: String,
    },

    /// An internal store error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Creates a new `InvalidWorkload` error.
    #[must_use]
    pub fn invalid_workload(message: impl Into<String>) -> Self {
        Self::InvalidWorkload {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::InvalidWorkload { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of store errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Workload not found.
    NotFound,
    /// Conflict with an existing workload.
    Conflict,
    /// Validation error.
    Validation,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("hub/app");
        assert_eq!(err.to_string(), "Workload not found: hub/app");

        let err = StoreError::already_exists("hub/app");
        assert_eq!(err.to_string(), "Workload already exists: hub/app");
    }

    #[test]
    fn test_error_predicates() {
        let err = StoreError::not_found("hub/app");
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());

        let err = StoreError::already_exists("hub/app");
        assert!(!err.is_not_found());
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StoreError::not_found("hub/app").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StoreError::internal("backend down").category(),
            ErrorCategory::Internal
        );
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
    }
}
