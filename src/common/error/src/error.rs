//! Core error types for Spillway.

use thiserror::Error;

/// Result type alias using `SpillwayError`.
pub type SpillwayResult<T> = std::result::Result<T, SpillwayError>;

/// Core error type for Spillway operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpillwayError {
    /// Two configuration settings that cannot be active together.
    #[error("ConfigConflict: {0}")]
    ConfigConflict(String),

    /// A dispatch slot expected in the host engine is absent.
    #[error("MissingRebindTarget: {0}")]
    MissingRebindTarget(String),

    /// The current platform cannot run device workers.
    #[error("UnsupportedPlatform: {0}")]
    UnsupportedPlatform(String),

    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Column not found in schema.
    #[error("ColumnNotFound: {0}")]
    ColumnNotFound(String),

    /// Shuffle or transport execution error.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Internal error (bug in Spillway).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl SpillwayError {
    /// Create a new `ConfigConflict` error.
    pub fn config_conflict<S: Into<String>>(msg: S) -> Self {
        Self::ConfigConflict(msg.into())
    }

    /// Create a new `MissingRebindTarget` error.
    pub fn missing_rebind_target<S: Into<String>>(msg: S) -> Self {
        Self::MissingRebindTarget(msg.into())
    }

    /// Create a new `UnsupportedPlatform` error.
    pub fn unsupported_platform<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedPlatform(msg.into())
    }

    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `ColumnNotFound` error.
    pub fn column_not_found<S: Into<String>>(msg: S) -> Self {
        Self::ColumnNotFound(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a resource exhausted error (using `ExecutionError`).
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(format!("ResourceExhausted: {}", msg.into()))
    }

    /// Whether this error aborts initialization rather than a single call.
    pub fn is_fatal_at_init(&self) -> bool {
        matches!(
            self,
            Self::ConfigConflict(_) | Self::MissingRebindTarget(_) | Self::UnsupportedPlatform(_)
        )
    }
}

/// Return early with a `ValueError`.
#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        return Err($crate::SpillwayError::ValueError(format!($($arg)*)))
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::SpillwayError::TypeError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpillwayError::config_conflict("explicit-comms with query planning");
        assert_eq!(
            err.to_string(),
            "ConfigConflict: explicit-comms with query planning"
        );
    }

    #[test]
    fn test_fatal_at_init() {
        assert!(SpillwayError::config_conflict("x").is_fatal_at_init());
        assert!(SpillwayError::missing_rebind_target("bag").is_fatal_at_init());
        assert!(!SpillwayError::value_error("x").is_fatal_at_init());
        assert!(!SpillwayError::execution("x").is_fatal_at_init());
    }
}
