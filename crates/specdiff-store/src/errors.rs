//! Error handling for specdiff-store
//!
//! Wraps specdiff-core ExError with store-specific helpers

use specdiff_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a missing specification error
pub fn spec_missing(spec_id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("list_events")
        .with_spec_id(spec_id)
        .with_message(format!("No event log for specification {}", spec_id))
}

/// Create an event log digest mismatch error
pub fn digest_mismatch(spec_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("list_events")
        .with_spec_id(spec_id)
        .with_message(format!(
            "Event log digest mismatch: expected {}, got {}",
            expected, actual
        ))
}

/// Create an invalid storage key error (ids are used as file names)
pub fn invalid_key(what: &str, key: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("store_key")
        .with_entity_id(key)
        .with_message(format!("{} id is not a valid storage key", what))
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an error for a blocking task that did not complete
pub fn task_error(operation: &str, err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
