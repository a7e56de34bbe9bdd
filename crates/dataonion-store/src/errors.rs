//! Error handling for dataonion-store
//!
//! Wraps dataonion-core ExError with store-specific helpers

use dataonion_core::errors::{DataOnionError, ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create an initializer failure wrapping the underlying cause
pub fn initializer_failed(context_key: &str, initializer: &str, source: ExError) -> ExError {
    ExError::from(DataOnionError::InitializerFailed {
        key: context_key.to_string(),
        reason: format!("Initializer {} failed: {}", initializer, source),
    })
    .with_source(source)
}

/// An initializer tried to initialize through the guard it is running under
pub fn reentrant_initialization() -> ExError {
    ExError::new(ExErrorKind::InitializerFailed)
        .with_op("context_initialize")
        .with_message("initializer created a context through the guard it is running under")
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
