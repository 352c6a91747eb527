use crate::storage::FolderError;
use thiserror::Error;

/// Coarse classification of a failure, used by callers to decide between
/// fixing input, re-reading state, or aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A required argument was missing or malformed.
    Validation,
    /// The current state conflicts with the request (missing or duplicate entity).
    State,
    /// Disk, database or other environment failure.
    Environment,
    /// The operation was cancelled before it completed.
    Cancelled,
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Folder error: {0}")]
    Folder(#[from] FolderError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with key {key}")]
    AlreadyExists { entity_type: String, key: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::Folder(err) => err.category(),
            LibraryError::InvalidInput { .. } => ErrorCategory::Validation,
            LibraryError::NotFound { .. } | LibraryError::AlreadyExists { .. } => {
                ErrorCategory::State
            }
            LibraryError::Database(_) | LibraryError::Migration(_) => ErrorCategory::Environment,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
