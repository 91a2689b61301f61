use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A unique constraint rejected the write.
    #[error("{what} already exists")]
    Duplicate {
        /// Description of the conflicting record.
        what: String,
    },
    /// The record changed since it was read; reload and retry.
    #[error("{what} was modified concurrently")]
    Stale {
        /// Description of the outdated record.
        what: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a unique-constraint violation for `what`.
    pub fn duplicate(what: impl Into<String>) -> Self {
        StorageError::Duplicate { what: what.into() }
    }

    /// Construct an optimistic-concurrency failure for `what`.
    pub fn stale(what: impl Into<String>) -> Self {
        StorageError::Stale { what: what.into() }
    }
}
