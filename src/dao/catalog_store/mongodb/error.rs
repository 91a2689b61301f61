use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures of the MongoDB store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection URI rejected by the driver.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Database never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Last driver error.
        #[source]
        source: MongoError,
    },
    /// Health check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection being indexed.
        collection: &'static str,
        /// Index key list.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Lookup rows could not be upserted.
    #[error("failed to seed lookup table `{table}`")]
    SeedLookups {
        /// Table being seeded.
        table: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Unique index violation.
    #[error("{what} already exists")]
    Duplicate {
        /// Conflicting record.
        what: String,
    },
    /// Replace matched no document with the expected generation.
    #[error("{what} was modified concurrently")]
    Stale {
        /// Outdated record.
        what: String,
    },
    /// Any other write failure.
    #[error("failed to write to collection `{collection}`")]
    Write {
        /// Target collection.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Query failure.
    #[error("failed to read from collection `{collection}`")]
    Read {
        /// Queried collection.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Stored document does not map back to an entity.
    #[error("stored document in `{collection}` is malformed: {reason}")]
    Malformed {
        /// Collection holding the document.
        collection: &'static str,
        /// What failed to parse.
        reason: String,
    },
}

impl MongoDaoError {
    /// Map a write failure, turning unique-index violations into [`MongoDaoError::Duplicate`].
    pub fn from_write(collection: &'static str, what: String, source: MongoError) -> Self {
        if is_duplicate_key(&source) {
            MongoDaoError::Duplicate { what }
        } else {
            MongoDaoError::Write { collection, source }
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}
