use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{
        FILE_COLLECTION_NAME, LOOKUP_COLLECTION_NAME, MongoFileDocument, MongoLookupDocument,
        MongoPageDocument, MongoVoteDocument, PAGE_COLLECTION_NAME, VOTE_COLLECTION_NAME,
    },
};
use crate::dao::{
    catalog_store::CatalogStore,
    models::{
        FileEntity, GameDepKind, LookupEntity, LookupTable, PageEntity, VoteEntity, VoteTally,
    },
    storage::StorageResult,
};

/// MongoDB-backed [`CatalogStore`] implementation.
///
/// Pages are stored as whole documents embedding their revisions, binaries and
/// dependencies, so deleting a page document takes its revisions with it.
#[derive(Clone)]
pub struct MongoCatalogStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoCatalogStore {
    /// Connect to MongoDB, ensure indexes are present and seed the lookup tables.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        store.seed_lookups().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let indexes: [(&'static str, &'static str, Document, bool, Option<Document>); 3] = [
            (
                PAGE_COLLECTION_NAME,
                "kind,name",
                doc! { "kind": 1, "name": 1 },
                true,
                Some(doc! { "deleted": false }),
            ),
            (
                VOTE_COLLECTION_NAME,
                "page_id,user",
                doc! { "page_id": 1, "user": 1 },
                true,
                None,
            ),
            (
                LOOKUP_COLLECTION_NAME,
                "table,name",
                doc! { "table": 1, "name": 1 },
                true,
                None,
            ),
        ];

        for (collection, index, keys, unique, partial) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(unique))
                        .partial_filter_expression(partial)
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn seed_lookups(&self) -> MongoResult<()> {
        let collection = self.lookup_collection().await;
        for table in LookupTable::ALL {
            for row in table.seed() {
                let filter = doc! { "table": table.as_str(), "name": row.name.as_str() };
                let document: MongoLookupDocument = row.into();
                collection
                    .replace_one(filter, &document)
                    .upsert(true)
                    .await
                    .map_err(|source| MongoDaoError::SeedLookups {
                        table: table.as_str(),
                        source,
                    })?;
            }
        }
        info!("lookup tables seeded");
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn page_collection(&self) -> Collection<MongoPageDocument> {
        self.database()
            .await
            .collection::<MongoPageDocument>(PAGE_COLLECTION_NAME)
    }

    async fn vote_collection(&self) -> Collection<MongoVoteDocument> {
        self.database()
            .await
            .collection::<MongoVoteDocument>(VOTE_COLLECTION_NAME)
    }

    async fn file_collection(&self) -> Collection<MongoFileDocument> {
        self.database()
            .await
            .collection::<MongoFileDocument>(FILE_COLLECTION_NAME)
    }

    async fn lookup_collection(&self) -> Collection<MongoLookupDocument> {
        self.database()
            .await
            .collection::<MongoLookupDocument>(LOOKUP_COLLECTION_NAME)
    }

    async fn find_one_page(&self, filter: Document) -> MongoResult<Option<PageEntity>> {
        let document = self
            .page_collection()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: PAGE_COLLECTION_NAME,
                source,
            })?;

        document.map(PageEntity::try_from).transpose()
    }

    async fn list_pages(&self, kind: GameDepKind) -> MongoResult<Vec<PageEntity>> {
        let read_err = |source| MongoDaoError::Read {
            collection: PAGE_COLLECTION_NAME,
            source,
        };

        let documents: Vec<MongoPageDocument> = self
            .page_collection()
            .await
            .find(doc! { "kind": kind.as_str(), "deleted": false })
            .sort(doc! { "name": 1 })
            .await
            .map_err(read_err)?
            .try_collect()
            .await
            .map_err(read_err)?;

        documents.into_iter().map(PageEntity::try_from).collect()
    }

    async fn insert_page(&self, page: PageEntity) -> MongoResult<()> {
        let what = format!("page `{}`", page.name);
        let document: MongoPageDocument = page.into();
        self.page_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::from_write(PAGE_COLLECTION_NAME, what, source))?;
        Ok(())
    }

    /// Replace the page only if nobody saved it since it was read.
    async fn save_page(&self, mut page: PageEntity) -> MongoResult<()> {
        let what = format!("page `{}`", page.name);
        let filter = doc! {
            "_id": page.id.to_string(),
            "generation": i64::try_from(page.generation).unwrap_or(i64::MAX),
        };
        page.generation += 1;
        let document: MongoPageDocument = page.into();
        let result = self
            .page_collection()
            .await
            .replace_one(filter, &document)
            .await
            .map_err(|source| {
                MongoDaoError::from_write(PAGE_COLLECTION_NAME, what.clone(), source)
            })?;

        if result.matched_count == 0 {
            return Err(MongoDaoError::Stale { what });
        }
        Ok(())
    }

    async fn insert_file(&self, file: FileEntity) -> MongoResult<()> {
        let what = format!("file `{}`", file.id);
        let document: MongoFileDocument = file.into();
        self.file_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::from_write(FILE_COLLECTION_NAME, what, source))?;
        Ok(())
    }

    async fn find_file(&self, id: Uuid) -> MongoResult<Option<FileEntity>> {
        let document = self
            .file_collection()
            .await
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: FILE_COLLECTION_NAME,
                source,
            })?;

        document.map(FileEntity::try_from).transpose()
    }

    async fn delete_file(&self, id: Uuid) -> MongoResult<()> {
        self.file_collection()
            .await
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: FILE_COLLECTION_NAME,
                source,
            })?;
        Ok(())
    }

    async fn record_download(&self, id: Uuid) -> MongoResult<()> {
        self.file_collection()
            .await
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "download_count": 1_i64 } },
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: FILE_COLLECTION_NAME,
                source,
            })?;
        Ok(())
    }

    async fn insert_vote(&self, vote: VoteEntity) -> MongoResult<()> {
        let what = format!("vote of `{}` on page `{}`", vote.user, vote.page_id);
        let document: MongoVoteDocument = vote.into();
        self.vote_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::from_write(VOTE_COLLECTION_NAME, what, source))?;
        Ok(())
    }

    async fn count_votes(&self, page_id: Uuid) -> MongoResult<VoteTally> {
        let collection = self.vote_collection().await;
        let read_err = |source| MongoDaoError::Read {
            collection: VOTE_COLLECTION_NAME,
            source,
        };

        let likes = collection
            .count_documents(doc! { "page_id": page_id.to_string(), "like": true })
            .await
            .map_err(read_err)?;
        let dislikes = collection
            .count_documents(doc! { "page_id": page_id.to_string(), "like": false })
            .await
            .map_err(read_err)?;

        Ok(VoteTally { likes, dislikes })
    }

    async fn list_lookups(&self, table: LookupTable) -> MongoResult<Vec<LookupEntity>> {
        let read_err = |source| MongoDaoError::Read {
            collection: LOOKUP_COLLECTION_NAME,
            source,
        };

        let documents: Vec<MongoLookupDocument> = self
            .lookup_collection()
            .await
            .find(doc! { "table": table.as_str() })
            .sort(doc! { "position": 1 })
            .await
            .map_err(read_err)?
            .try_collect()
            .await
            .map_err(read_err)?;

        documents.into_iter().map(LookupEntity::try_from).collect()
    }
}

impl CatalogStore for MongoCatalogStore {
    fn find_page(
        &self,
        kind: GameDepKind,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one_page(doc! { "kind": kind.as_str(), "name": name, "deleted": false })
                .await
                .map_err(Into::into)
        })
    }

    fn find_page_by_id(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_one_page(doc! { "_id": id.to_string(), "deleted": false })
                .await
                .map_err(Into::into)
        })
    }

    fn list_pages(&self, kind: GameDepKind) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_pages(kind).await.map_err(Into::into) })
    }

    fn insert_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_page(page).await.map_err(Into::into) })
    }

    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_page(page).await.map_err(Into::into) })
    }

    fn insert_file(&self, file: FileEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_file(file).await.map_err(Into::into) })
    }

    fn find_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FileEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_file(id).await.map_err(Into::into) })
    }

    fn delete_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_file(id).await.map_err(Into::into) })
    }

    fn record_download(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.record_download(id).await.map_err(Into::into) })
    }

    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_vote(vote).await.map_err(Into::into) })
    }

    fn count_votes(&self, page_id: Uuid) -> BoxFuture<'static, StorageResult<VoteTally>> {
        let store = self.clone();
        Box::pin(async move { store.count_votes(page_id).await.map_err(Into::into) })
    }

    fn list_lookups(
        &self,
        table: LookupTable,
    ) -> BoxFuture<'static, StorageResult<Vec<LookupEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_lookups(table).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
