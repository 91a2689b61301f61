mod config;
mod error;
mod models;
/// Store implementation over the MongoDB driver.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoCatalogStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { what } => StorageError::Duplicate { what },
            MongoDaoError::Stale { what } => StorageError::Stale { what },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
