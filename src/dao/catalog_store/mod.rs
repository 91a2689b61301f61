/// In-process store backed by concurrent maps.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    FileEntity, GameDepKind, LookupEntity, LookupTable, PageEntity, VoteEntity, VoteTally,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::MemoryCatalogStore;

/// Abstraction over the persistence layer for catalog pages, uploaded files and votes.
///
/// Page lookups by name only ever see live (not soft-deleted) pages.
pub trait CatalogStore: Send + Sync {
    /// Live page of `kind` named `name`.
    fn find_page(
        &self,
        kind: GameDepKind,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PageEntity>>>;
    /// Live page with the given id.
    fn find_page_by_id(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>>;
    /// Every live page of `kind`.
    fn list_pages(&self, kind: GameDepKind) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>>;
    /// Fails with [`StorageError::Duplicate`](crate::dao::storage::StorageError::Duplicate) when
    /// a live page of the same kind already uses the name.
    fn insert_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a stored page, bumping its generation.
    ///
    /// Fails with [`StorageError::Stale`](crate::dao::storage::StorageError::Stale) when the
    /// stored generation no longer matches `page.generation`.
    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Store an uploaded file.
    fn insert_file(&self, file: FileEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Uploaded file with the given id.
    fn find_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FileEntity>>>;
    /// Remove a file; missing files are ignored.
    fn delete_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;
    /// Increment the download counter of a file.
    fn record_download(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Fails with a duplicate error when `(user, page_id)` already voted.
    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Likes and dislikes of a page.
    fn count_votes(&self, page_id: Uuid) -> BoxFuture<'static, StorageResult<VoteTally>>;

    /// Rows of a lookup table in display order.
    fn list_lookups(
        &self,
        table: LookupTable,
    ) -> BoxFuture<'static, StorageResult<Vec<LookupEntity>>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
