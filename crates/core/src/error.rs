//! Error types for the Gazette domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Client input and wiring errors
//! - [`StorageError`] - Database/repository errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Client input and configuration errors.
///
/// Variants other than `Storage` describe problems in the request itself
/// (a malformed cursor, an out-of-range page size) or in the relation
/// wiring, and are safe to report verbatim to the caller.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Cursor string could not be decoded.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Pagination argument out of allowed bounds.
    #[error("Invalid pagination argument `{argument}`: {message}")]
    InvalidPaginationArgs {
        /// Name of the offending argument.
        argument: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// No relation registered for (entity, relation name).
    ///
    /// This is a wiring error, caught by startup validation.
    #[error("Unknown relation: {entity}.{name}")]
    UnknownRelation { entity: String, name: String },

    /// Generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Whether this error was caused by the client's input.
    ///
    /// Client errors are reported precisely; everything else surfaces
    /// as a generic internal error so query structure never leaks.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidCursor(_)
                | DomainError::InvalidPaginationArgs { .. }
                | DomainError::ValidationError(_)
        )
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries,
/// connection acquisition, and data conversion.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query exceeded the store's deadline.
    #[error("Query timed out: {0}")]
    Timeout(String),

    /// Requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Row-to-model conversion failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la chaîne de conversion d'erreurs fonctionne
    // Permet d'utiliser ? à travers les couches
    #[test]
    fn test_error_conversion_chain() {
        let storage_err = StorageError::QueryError("db failed".into());
        let domain_err: DomainError = storage_err.into();

        // Le message original est préservé
        assert!(domain_err.to_string().contains("db failed"));
        assert!(!domain_err.is_client_error());
    }

    // Test critique: seules les erreurs d'entrée sont considérées "client"
    // Les erreurs de stockage ne doivent jamais fuiter en détail
    #[test]
    fn test_client_error_classification() {
        assert!(DomainError::InvalidCursor("bad".into()).is_client_error());
        assert!(DomainError::InvalidPaginationArgs {
            argument: "first",
            message: "out of bounds".into(),
        }
        .is_client_error());

        assert!(!DomainError::UnknownRelation {
            entity: "post".into(),
            name: "ghosts".into(),
        }
        .is_client_error());
        assert!(
            !DomainError::Storage(StorageError::Timeout("deadline".into())).is_client_error()
        );
    }

    #[test]
    fn test_pagination_error_names_argument() {
        let err = DomainError::InvalidPaginationArgs {
            argument: "first",
            message: "must be between 1 and 50, got 500".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("first"));
        assert!(msg.contains("500"));
    }
}
