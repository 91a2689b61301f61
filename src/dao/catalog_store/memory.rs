use std::{collections::HashMap, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    catalog_store::CatalogStore,
    models::{
        FileEntity, GameDepKind, LookupEntity, LookupTable, PageEntity, VoteEntity, VoteTally,
    },
    storage::{StorageError, StorageResult},
};

/// In-process [`CatalogStore`] used for development setups and tests.
#[derive(Clone)]
pub struct MemoryCatalogStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    pages: DashMap<Uuid, PageEntity>,
    /// Live page names, keyed per kind.
    names: DashMap<(GameDepKind, String), Uuid>,
    files: DashMap<Uuid, FileEntity>,
    votes: DashMap<(Uuid, String), VoteEntity>,
    lookups: HashMap<LookupTable, Vec<LookupEntity>>,
}

impl MemoryCatalogStore {
    /// Create an empty store with the lookup tables seeded.
    pub fn new() -> Self {
        let lookups = LookupTable::ALL
            .into_iter()
            .map(|table| (table, table.seed()))
            .collect();

        Self {
            inner: Arc::new(MemoryInner {
                pages: DashMap::new(),
                names: DashMap::new(),
                files: DashMap::new(),
                votes: DashMap::new(),
                lookups,
            }),
        }
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInner {
    fn claim_name(&self, kind: GameDepKind, name: String, id: Uuid) -> StorageResult<()> {
        match self.names.entry((kind, name)) {
            Entry::Occupied(entry) if *entry.get() != id => Err(StorageError::duplicate(format!(
                "page `{}`",
                entry.key().1
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    fn release_name(&self, kind: GameDepKind, name: String, id: Uuid) {
        self.names.remove_if(&(kind, name), |_, owner| *owner == id);
    }

    fn find_page(&self, kind: GameDepKind, name: String) -> Option<PageEntity> {
        let id = self.names.get(&(kind, name)).map(|entry| *entry.value())?;
        self.pages
            .get(&id)
            .filter(|page| !page.deleted)
            .map(|page| page.value().clone())
    }

    fn insert_page(&self, page: PageEntity) -> StorageResult<()> {
        if self.pages.contains_key(&page.id) {
            return Err(StorageError::duplicate(format!("page id `{}`", page.id)));
        }
        if !page.deleted {
            self.claim_name(page.kind, page.name.clone(), page.id)?;
        }
        self.pages.insert(page.id, page);
        Ok(())
    }

    fn save_page(&self, mut page: PageEntity) -> StorageResult<()> {
        let mut stored = self
            .pages
            .get_mut(&page.id)
            .ok_or_else(|| StorageError::stale(format!("page `{}`", page.id)))?;
        if stored.generation != page.generation {
            return Err(StorageError::stale(format!("page `{}`", page.name)));
        }

        if !page.deleted {
            self.claim_name(page.kind, page.name.clone(), page.id)?;
        }
        let still_owns_name =
            !page.deleted && page.kind == stored.kind && page.name == stored.name;
        if !stored.deleted && !still_owns_name {
            self.release_name(stored.kind, stored.name.clone(), page.id);
        }

        page.generation += 1;
        *stored = page;
        Ok(())
    }

    fn insert_vote(&self, vote: VoteEntity) -> StorageResult<()> {
        match self.votes.entry((vote.page_id, vote.user.clone())) {
            Entry::Occupied(_) => Err(StorageError::duplicate(format!(
                "vote of `{}` on page `{}`",
                vote.user, vote.page_id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(vote);
                Ok(())
            }
        }
    }

    fn count_votes(&self, page_id: Uuid) -> VoteTally {
        self.votes
            .iter()
            .filter(|entry| entry.page_id == page_id)
            .fold(VoteTally::default(), |mut tally, entry| {
                if entry.like {
                    tally.likes += 1;
                } else {
                    tally.dislikes += 1;
                }
                tally
            })
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn find_page(
        &self,
        kind: GameDepKind,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.find_page(kind, name)) })
    }

    fn find_page_by_id(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .pages
                .get(&id)
                .filter(|page| !page.deleted)
                .map(|page| page.value().clone()))
        })
    }

    fn list_pages(&self, kind: GameDepKind) -> BoxFuture<'static, StorageResult<Vec<PageEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut pages: Vec<PageEntity> = store
                .inner
                .pages
                .iter()
                .filter(|page| page.kind == kind && !page.deleted)
                .map(|page| page.value().clone())
                .collect();
            pages.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(pages)
        })
    }

    fn insert_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.insert_page(page) })
    }

    fn save_page(&self, page: PageEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.save_page(page) })
    }

    fn insert_file(&self, file: FileEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.files.insert(file.id, file);
            Ok(())
        })
    }

    fn find_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FileEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.files.get(&id).map(|file| file.value().clone())) })
    }

    fn delete_file(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.files.remove(&id);
            Ok(())
        })
    }

    fn record_download(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if let Some(mut file) = store.inner.files.get_mut(&id) {
                file.download_count += 1;
            }
            Ok(())
        })
    }

    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.insert_vote(vote) })
    }

    fn count_votes(&self, page_id: Uuid) -> BoxFuture<'static, StorageResult<VoteTally>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.count_votes(page_id)) })
    }

    fn list_lookups(
        &self,
        table: LookupTable,
    ) -> BoxFuture<'static, StorageResult<Vec<LookupEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .lookups
                .get(&table)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn page(name: &str) -> PageEntity {
        PageEntity::new(
            GameDepKind::Game,
            name.into(),
            name.to_uppercase(),
            "admin".into(),
        )
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected_per_kind() {
        let store = MemoryCatalogStore::new();
        store.insert_page(page("pong")).await.unwrap();

        let err = store.insert_page(page("pong")).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));

        let mut dep = page("pong");
        dep.kind = GameDepKind::Dependency;
        store.insert_page(dep).await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_hides_page_and_frees_name() {
        let store = MemoryCatalogStore::new();
        let mut original = page("pong");
        store.insert_page(original.clone()).await.unwrap();

        original.deleted = true;
        store.save_page(original.clone()).await.unwrap();

        assert!(
            store
                .find_page(GameDepKind::Game, "pong".into())
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.find_page_by_id(original.id).await.unwrap().is_none());
        store.insert_page(page("pong")).await.unwrap();
    }

    #[tokio::test]
    async fn rename_moves_name_claim() {
        let store = MemoryCatalogStore::new();
        let mut pong = page("pong");
        store.insert_page(pong.clone()).await.unwrap();
        store.insert_page(page("tetris")).await.unwrap();

        pong.name = "tetris".into();
        let err = store.save_page(pong.clone()).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));

        pong.name = "pong2".into();
        store.save_page(pong).await.unwrap();
        assert!(
            store
                .find_page(GameDepKind::Game, "pong".into())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_page(GameDepKind::Game, "pong2".into())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn save_with_outdated_generation_is_stale() {
        let store = MemoryCatalogStore::new();
        let original = page("pong");
        store.insert_page(original.clone()).await.unwrap();

        let mut first = original.clone();
        first.description = "first".into();
        store.save_page(first).await.unwrap();

        let mut second = original.clone();
        second.description = "second".into();
        let err = store.save_page(second).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale { .. }));

        let stored = store.find_page_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.description, "first");
        assert_eq!(stored.generation, 1);
    }

    #[tokio::test]
    async fn stale_write_cannot_undo_soft_delete() {
        let store = MemoryCatalogStore::new();
        let original = page("pong");
        store.insert_page(original.clone()).await.unwrap();

        let mut deleted = original.clone();
        deleted.deleted = true;
        store.save_page(deleted).await.unwrap();

        let mut edited = original.clone();
        edited.display_name = "Revived".into();
        let err = store.save_page(edited).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale { .. }));
        assert!(
            store
                .find_page(GameDepKind::Game, "pong".into())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn saving_unknown_page_is_stale() {
        let store = MemoryCatalogStore::new();
        let err = store.save_page(page("ghost")).await.unwrap_err();
        assert!(matches!(err, StorageError::Stale { .. }));
    }

    #[tokio::test]
    async fn second_vote_is_a_duplicate() {
        let store = MemoryCatalogStore::new();
        let page_id = Uuid::new_v4();
        let vote = |user: &str, like: bool| VoteEntity {
            id: Uuid::new_v4(),
            page_id,
            user: user.into(),
            like,
            created_at: SystemTime::now(),
        };

        store.insert_vote(vote("alice", true)).await.unwrap();
        store.insert_vote(vote("bob", false)).await.unwrap();
        assert!(store.insert_vote(vote("alice", false)).await.is_err());

        let tally = store.count_votes(page_id).await.unwrap();
        assert_eq!(tally, VoteTally { likes: 1, dislikes: 1 });
    }

    #[tokio::test]
    async fn download_counter_increments() {
        let store = MemoryCatalogStore::new();
        let file = FileEntity::new("a.zip".into(), "application/zip".into(), vec![1, 2, 3]);
        let id = file.id;
        store.insert_file(file).await.unwrap();
        store.record_download(id).await.unwrap();
        store.record_download(id).await.unwrap();

        let stored = store.find_file(id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 2);
        assert_eq!(stored.size, 3);
    }
}
