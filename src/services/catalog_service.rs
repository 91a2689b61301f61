//! Page and revision bookkeeping for both halves of the catalog.
//!
//! Every mutation loads the live page by name, edits it in memory and writes
//! the whole page back through the [`CatalogStore`]. Writes carry the page
//! generation they were based on; a concurrent save makes them retry on a
//! fresh copy (see [`modify_page`]).

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        catalog_store::CatalogStore,
        models::{GameDepKind, LookupTable, ModuleType, PageEntity, RevisionEntity},
        storage::StorageError,
    },
    dto::{
        format_system_time,
        gamedep::{
            ApiPageResponse, DependencySummary, EditPageRequest, FileRef, PageDetail,
            RevisionRequest, RevisionSummary, kind_label,
        },
        validation::parse_tags,
    },
    error::ServiceError,
    services::lookup_service,
    state::SharedState,
};

/// Save attempts of one mutation before reporting a conflict.
const MAX_WRITE_ATTEMPTS: usize = 32;

/// Sorted names of the live pages of `kind`.
pub async fn list(state: &SharedState, kind: GameDepKind) -> Result<Vec<String>, ServiceError> {
    let store = state.require_catalog_store().await?;
    let mut names: Vec<String> = store
        .list_pages(kind)
        .await?
        .into_iter()
        .map(|page| page.name)
        .collect();
    names.sort();
    Ok(names)
}

/// Fetch a page and one of its revisions.
///
/// Without `revision` the newest revision is returned. With `require_revision`
/// a page that has no revision at all is reported as missing.
pub async fn show(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision: Option<Uuid>,
    require_revision: bool,
) -> Result<(PageEntity, Option<RevisionEntity>), ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    let selected = select_revision(&page, revision, require_revision)?.cloned();
    Ok((page, selected))
}

/// Whether a live page named `name` exists, optionally with a revision numbered `version`.
pub async fn exists(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    version: Option<f64>,
) -> Result<bool, ServiceError> {
    let store = state.require_catalog_store().await?;
    let Some(page) = store.find_page(kind, name.to_owned()).await? else {
        return Ok(false);
    };
    Ok(match version {
        Some(version) => page.revisions.iter().any(|rev| rev.version == version),
        None => true,
    })
}

/// Create a page owned by `owner`.
pub async fn create(
    state: &SharedState,
    kind: GameDepKind,
    request: EditPageRequest,
    owner: &str,
) -> Result<PageEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    if store.find_page(kind, request.name.clone()).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "page `{}` already exists",
            request.name
        )));
    }

    let mut page = PageEntity::new(kind, request.name, request.display_name, owner.to_owned());
    page.description = request.description;
    page.tags = parse_tags(&request.tags);
    store.insert_page(page.clone()).await?;

    info!(kind = kind.as_str(), page = %page.name, owner, "page created");
    Ok(page)
}

/// Overwrite the editable fields of a page, renaming it when `request.name` differs.
pub async fn update(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    request: EditPageRequest,
) -> Result<PageEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    if request.name != name && store.find_page(kind, request.name.clone()).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "page `{}` already exists",
            request.name
        )));
    }

    let tags = parse_tags(&request.tags);
    let (page, ()) = modify_page(&store, kind, name, |page| {
        page.name.clone_from(&request.name);
        page.display_name.clone_from(&request.display_name);
        page.description.clone_from(&request.description);
        page.tags.clone_from(&tags);
        Ok(())
    })
    .await?;

    info!(kind = kind.as_str(), page = %name, new_name = %page.name, "page updated");
    Ok(page)
}

/// Update the page when it exists, otherwise create it. The flag reports a creation.
pub async fn edit_page(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    request: EditPageRequest,
    owner: &str,
) -> Result<(PageEntity, bool), ServiceError> {
    if exists(state, kind, name, None).await? {
        Ok((update(state, kind, name, request).await?, false))
    } else {
        Ok((create(state, kind, request, owner).await?, true))
    }
}

/// Soft delete a page. Its name becomes available again.
pub async fn delete(state: &SharedState, kind: GameDepKind, name: &str) -> Result<(), ServiceError> {
    let store = state.require_catalog_store().await?;
    modify_page(&store, kind, name, |page| {
        page.deleted = true;
        Ok(())
    })
    .await?;
    info!(kind = kind.as_str(), page = %name, "page deleted");
    Ok(())
}

/// Add a new revision on top of the page.
pub async fn create_revision(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    request: RevisionRequest,
) -> Result<RevisionEntity, ServiceError> {
    let module_type = resolve_module_type(state, &request.module_type).await?;
    let store = state.require_catalog_store().await?;
    let (_, revision) = modify_page(&store, kind, name, |page| {
        ensure_version_free(page, request.version, None)?;
        let revision = RevisionEntity::new(request.version, module_type);
        page.push_revision(revision.clone());
        Ok(revision)
    })
    .await?;

    info!(
        kind = kind.as_str(),
        page = %name,
        version = %revision.version_label(),
        "revision created"
    );
    Ok(revision)
}

/// Change the version number and module type of a revision.
pub async fn update_revision(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    request: RevisionRequest,
) -> Result<RevisionEntity, ServiceError> {
    let module_type = resolve_module_type(state, &request.module_type).await?;
    let store = state.require_catalog_store().await?;
    let (_, updated) = modify_page(&store, kind, name, |page| {
        ensure_version_free(page, request.version, Some(revision_id))?;
        let revision = revision_mut(page, revision_id)?;
        revision.version = request.version;
        revision.module_type = module_type;
        Ok(revision.clone())
    })
    .await?;

    info!(
        kind = kind.as_str(),
        page = %name,
        revision = %revision_id,
        version = %updated.version_label(),
        "revision updated"
    );
    Ok(updated)
}

/// Update `revision` when given, otherwise create a new one. The flag reports a creation.
pub async fn edit_revision(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision: Option<Uuid>,
    request: RevisionRequest,
) -> Result<(RevisionEntity, bool), ServiceError> {
    match revision {
        Some(id) => Ok((update_revision(state, kind, name, id, request).await?, false)),
        None => Ok((create_revision(state, kind, name, request).await?, true)),
    }
}

/// Remove a revision together with its source and binary files.
pub async fn delete_revision(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
) -> Result<RevisionEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let (_, removed) = modify_page(&store, kind, name, |page| {
        let index = page
            .revisions
            .iter()
            .position(|rev| rev.id == revision_id)
            .ok_or_else(|| revision_not_found(name, revision_id))?;
        Ok(page.revisions.remove(index))
    })
    .await?;
    discard_files(&store, removed.file_ids()).await;

    info!(
        kind = kind.as_str(),
        page = %name,
        revision = %revision_id,
        "revision deleted"
    );
    Ok(removed)
}

/// Toggle the published flag of a revision.
///
/// A game revision needs its source archive and a dependency revision at least
/// one binary before it can be published. Unpublishing always succeeds.
pub async fn flip_published(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
) -> Result<RevisionEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let (_, updated) = modify_page(&store, kind, name, |page| {
        let revision = revision_mut(page, revision_id)?;
        if !revision.published {
            match kind {
                GameDepKind::Game if revision.source_file.is_none() => {
                    return Err(ServiceError::InvalidState(
                        "a source archive is required before publishing".into(),
                    ));
                }
                GameDepKind::Dependency if revision.binaries.is_empty() => {
                    return Err(ServiceError::InvalidState(
                        "at least one binary is required before publishing".into(),
                    ));
                }
                _ => {}
            }
        }

        revision.published = !revision.published;
        Ok(revision.clone())
    })
    .await?;

    info!(
        kind = kind.as_str(),
        page = %name,
        revision = %revision_id,
        published = updated.published,
        "revision publish flag toggled"
    );
    Ok(updated)
}

/// Item view of a page: metadata, revisions, resolved dependencies and votes.
pub async fn page_detail(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision: Option<Uuid>,
) -> Result<PageDetail, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    let selected = select_revision(&page, revision, false)?;
    let config = state.config();
    let file_url = |id: Uuid| config.file_url(id);

    let dependencies = resolve_dependencies(store.as_ref(), &page).await?;
    let votes = store.count_votes(page.id).await?;

    Ok(PageDetail {
        id: page.id,
        kind: kind_label(kind),
        name: page.name.clone(),
        display_name: page.display_name.clone(),
        description: page.description.clone(),
        owner: page.owner.clone(),
        created: format_system_time(page.created_at),
        tags: page.tags.clone(),
        pictures: page
            .pictures
            .iter()
            .map(|id| FileRef::new(*id, file_url(*id)))
            .collect(),
        revisions: page
            .revisions
            .iter()
            .map(|rev| RevisionSummary::from_entity(rev, file_url))
            .collect(),
        revision: selected.map(|rev| RevisionSummary::from_entity(rev, file_url)),
        dependencies,
        votes: votes.into(),
    })
}

/// Page plus every revision keyed by its version label.
pub async fn api_item(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
) -> Result<ApiPageResponse, ServiceError> {
    let (page, _) = show(state, kind, name, None, false).await?;
    let config = state.config();
    let versions = page
        .revisions
        .iter()
        .map(|rev| {
            (
                rev.version_label(),
                RevisionSummary::from_entity(rev, |id| config.file_url(id)),
            )
        })
        .collect();

    Ok(ApiPageResponse {
        id: page.id,
        kind: kind_label(kind),
        name: page.name,
        display_name: page.display_name,
        description: page.description,
        owner: page.owner,
        created: format_system_time(page.created_at),
        tags: page.tags,
        versions,
    })
}

/// Live page `name` of `kind`, or [`ServiceError::NotFound`].
pub(crate) async fn load_page(
    store: &dyn CatalogStore,
    kind: GameDepKind,
    name: &str,
) -> Result<PageEntity, ServiceError> {
    store
        .find_page(kind, name.to_owned())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("{} `{name}` not found", kind.export_key()))
        })
}

/// Load the live page, let `apply` edit it and save it back.
///
/// The save only succeeds when nobody else saved the page in between;
/// otherwise the page is reloaded and `apply` runs again on the fresh copy.
/// Errors from `apply` abort without writing anything. After
/// [`MAX_WRITE_ATTEMPTS`] lost races the caller gets a conflict.
pub(crate) async fn modify_page<T>(
    store: &Arc<dyn CatalogStore>,
    kind: GameDepKind,
    name: &str,
    mut apply: impl FnMut(&mut PageEntity) -> Result<T, ServiceError>,
) -> Result<(PageEntity, T), ServiceError> {
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let mut page = load_page(store.as_ref(), kind, name).await?;
        let outcome = apply(&mut page)?;
        match store.save_page(page.clone()).await {
            Ok(()) => {
                page.generation += 1;
                return Ok((page, outcome));
            }
            Err(StorageError::Stale { .. }) => {
                debug!(kind = kind.as_str(), page = %name, attempt, "page saved concurrently, retrying");
                tokio::task::yield_now().await;
            }
            Err(err) => return Err(err.into()),
        }
    }

    warn!(kind = kind.as_str(), page = %name, "giving up after repeated concurrent saves");
    Err(ServiceError::Conflict(format!(
        "`{name}` is being modified concurrently, try again"
    )))
}

pub(crate) fn revision_mut(
    page: &mut PageEntity,
    revision_id: Uuid,
) -> Result<&mut RevisionEntity, ServiceError> {
    let name = page.name.clone();
    page.revision_mut(revision_id)
        .ok_or_else(|| revision_not_found(&name, revision_id))
}

pub(crate) fn revision_not_found(name: &str, revision_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("revision `{revision_id}` of `{name}` not found"))
}

/// Best-effort removal of stored files no longer referenced by any page.
pub(crate) async fn discard_files(store: &Arc<dyn CatalogStore>, ids: Vec<Uuid>) {
    let results = join_all(ids.iter().map(|id| store.delete_file(*id))).await;
    for (id, result) in ids.iter().zip(results) {
        if let Err(err) = result {
            warn!(file = %id, error = %err, "failed to delete stored file");
        }
    }
}

fn select_revision(
    page: &PageEntity,
    revision: Option<Uuid>,
    require_revision: bool,
) -> Result<Option<&RevisionEntity>, ServiceError> {
    match revision {
        Some(id) => page
            .revision(id)
            .map(Some)
            .ok_or_else(|| revision_not_found(&page.name, id)),
        None if require_revision && page.revisions.is_empty() => Err(ServiceError::NotFound(
            format!("`{}` has no revisions", page.name),
        )),
        None => Ok(page.revisions.first()),
    }
}

fn ensure_version_free(
    page: &PageEntity,
    version: f64,
    except: Option<Uuid>,
) -> Result<(), ServiceError> {
    let taken = page
        .revisions
        .iter()
        .any(|rev| rev.version == version && Some(rev.id) != except);
    if taken {
        return Err(ServiceError::Conflict(format!(
            "version {} of `{}` already exists",
            crate::dao::models::format_version(version),
            page.name
        )));
    }
    Ok(())
}

async fn resolve_module_type(state: &SharedState, name: &str) -> Result<ModuleType, ServiceError> {
    lookup_service::require_lookup(state, LookupTable::ModuleTypes, name).await?;
    ModuleType::parse(name)
        .ok_or_else(|| ServiceError::InvalidInput(format!("`{name}` is not a valid moduletypes")))
}

async fn resolve_dependencies(
    store: &dyn CatalogStore,
    page: &PageEntity,
) -> Result<Vec<DependencySummary>, ServiceError> {
    let mut summaries = Vec::with_capacity(page.dependencies.len());
    for dependency in &page.dependencies {
        match store.find_page_by_id(dependency.page_id).await? {
            Some(target) if !target.deleted => {
                summaries.push(DependencySummary::resolve(dependency, &target));
            }
            _ => {}
        }
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{page_request, revision_request, state};

    #[tokio::test]
    async fn create_then_list_sorted() {
        let state = state();
        for name in ["tetris", "pong", "asteroids"] {
            create(&state, GameDepKind::Game, page_request(name), "admin")
                .await
                .unwrap();
        }
        create(&state, GameDepKind::Dependency, page_request("pygame"), "admin")
            .await
            .unwrap();

        let names = list(&state, GameDepKind::Game).await.unwrap();
        assert_eq!(names, vec!["asteroids", "pong", "tetris"]);
        assert_eq!(
            list(&state, GameDepKind::Dependency).await.unwrap(),
            vec!["pygame"]
        );
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict_but_other_kind_is_fine() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let err = create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(
            create(&state, GameDepKind::Dependency, page_request("pong"), "admin")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn tags_are_parsed_on_create() {
        let state = state();
        let mut request = page_request("pong");
        request.tags = "arcade, retro arcade".into();
        let page = create(&state, GameDepKind::Game, request, "admin")
            .await
            .unwrap();
        assert_eq!(page.tags, vec!["arcade", "retro"]);
        assert_eq!(page.owner, "admin");
    }

    #[tokio::test]
    async fn show_requires_revision_when_asked() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let (page, revision) = show(&state, GameDepKind::Game, "pong", None, false)
            .await
            .unwrap();
        assert_eq!(page.name, "pong");
        assert!(revision.is_none());

        let err = show(&state, GameDepKind::Game, "pong", None, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = show(&state, GameDepKind::Game, "pong", Some(Uuid::new_v4()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn exists_checks_versions() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap();

        assert!(exists(&state, GameDepKind::Game, "pong", None).await.unwrap());
        assert!(exists(&state, GameDepKind::Game, "pong", Some(0.1)).await.unwrap());
        assert!(!exists(&state, GameDepKind::Game, "pong", Some(0.2)).await.unwrap());
        assert!(!exists(&state, GameDepKind::Dependency, "pong", None).await.unwrap());
    }

    #[tokio::test]
    async fn rename_onto_existing_page_is_conflict() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        create(&state, GameDepKind::Game, page_request("tetris"), "admin")
            .await
            .unwrap();

        let err = update(&state, GameDepKind::Game, "pong", page_request("tetris"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let renamed = update(&state, GameDepKind::Game, "pong", page_request("pong2"))
            .await
            .unwrap();
        assert_eq!(renamed.name, "pong2");
        assert!(!exists(&state, GameDepKind::Game, "pong", None).await.unwrap());
    }

    #[tokio::test]
    async fn edit_page_creates_then_updates() {
        let state = state();
        let (_, created) = edit_page(&state, GameDepKind::Game, "pong", page_request("pong"), "bob")
            .await
            .unwrap();
        assert!(created);

        let mut request = page_request("pong");
        request.display_name = "Pong Deluxe".into();
        let (page, created) = edit_page(&state, GameDepKind::Game, "pong", request, "alice")
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(page.display_name, "Pong Deluxe");
        assert_eq!(page.owner, "bob");
    }

    #[tokio::test]
    async fn deleted_pages_disappear() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        delete(&state, GameDepKind::Game, "pong").await.unwrap();

        assert!(list(&state, GameDepKind::Game).await.unwrap().is_empty());
        let err = delete(&state, GameDepKind::Game, "pong").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(
            create(&state, GameDepKind::Game, page_request("pong"), "admin")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn revisions_reject_duplicate_versions_and_unknown_module_types() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let first = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap();
        let second = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.2))
            .await
            .unwrap();

        let err = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = update_revision(
            &state,
            GameDepKind::Game,
            "pong",
            second.id,
            revision_request(0.1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let mut bad = revision_request(0.3);
        bad.module_type = "egg".into();
        let err = create_revision(&state, GameDepKind::Game, "pong", bad)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let (page, newest) = show(&state, GameDepKind::Game, "pong", None, true)
            .await
            .unwrap();
        assert_eq!(newest.map(|rev| rev.id), Some(second.id));
        assert_eq!(page.revisions[1].id, first.id);
    }

    #[tokio::test]
    async fn update_revision_changes_module_type() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let (revision, created) =
            edit_revision(&state, GameDepKind::Game, "pong", None, revision_request(1.0))
                .await
                .unwrap();
        assert!(created);

        let mut request = revision_request(1.5);
        request.module_type = "folder".into();
        let (updated, created) =
            edit_revision(&state, GameDepKind::Game, "pong", Some(revision.id), request)
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(updated.module_type, ModuleType::Folder);
        assert_eq!(updated.version_label(), "1.5");
    }

    #[tokio::test]
    async fn publish_is_gated_on_attachments() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        create(&state, GameDepKind::Dependency, page_request("pygame"), "admin")
            .await
            .unwrap();
        let game_rev = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap();
        let dep_rev =
            create_revision(&state, GameDepKind::Dependency, "pygame", revision_request(0.1))
                .await
                .unwrap();

        let err = flip_published(&state, GameDepKind::Game, "pong", game_rev.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let err = flip_published(&state, GameDepKind::Dependency, "pygame", dep_rev.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn delete_revision_drops_it() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let revision = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap();

        delete_revision(&state, GameDepKind::Game, "pong", revision.id)
            .await
            .unwrap();
        let (page, _) = show(&state, GameDepKind::Game, "pong", None, false)
            .await
            .unwrap();
        assert!(page.revisions.is_empty());

        let err = delete_revision(&state, GameDepKind::Game, "pong", revision.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_revisions_are_all_kept() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let tasks: Vec<_> = (1..=16u8)
            .map(|n| {
                let state = state.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    create_revision(
                        &state,
                        GameDepKind::Game,
                        "pong",
                        revision_request(f64::from(n)),
                    )
                    .await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let (page, _) = show(&state, GameDepKind::Game, "pong", None, false)
            .await
            .unwrap();
        assert!(created > 0);
        assert_eq!(page.revisions.len(), created);
        assert_eq!(page.generation, created as u64);
    }

    #[tokio::test]
    async fn rejected_edit_writes_nothing() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let store = state.require_catalog_store().await.unwrap();

        let err = modify_page(&store, GameDepKind::Game, "pong", |page| {
            page.description = "changed".into();
            Err::<(), _>(ServiceError::InvalidState("nope".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let (page, _) = show(&state, GameDepKind::Game, "pong", None, false)
            .await
            .unwrap();
        assert_eq!(page.generation, 0);
        assert_ne!(page.description, "changed");
    }

    #[tokio::test]
    async fn api_item_keys_versions_by_label() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        create_revision(&state, GameDepKind::Game, "pong", revision_request(1.0))
            .await
            .unwrap();
        create_revision(&state, GameDepKind::Game, "pong", revision_request(1.25))
            .await
            .unwrap();

        let item = api_item(&state, GameDepKind::Game, "pong").await.unwrap();
        let keys: Vec<&str> = item.versions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1.25", "1.0"]);
        assert_eq!(item.kind, "games");
    }

    #[tokio::test]
    async fn page_detail_selects_newest_revision() {
        let state = state();
        create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let detail = page_detail(&state, GameDepKind::Game, "pong", None)
            .await
            .unwrap();
        assert!(detail.revision.is_none());
        assert_eq!(detail.votes.likes, 0);

        create_revision(&state, GameDepKind::Game, "pong", revision_request(0.1))
            .await
            .unwrap();
        let newest = create_revision(&state, GameDepKind::Game, "pong", revision_request(0.2))
            .await
            .unwrap();
        let detail = page_detail(&state, GameDepKind::Game, "pong", None)
            .await
            .unwrap();
        assert_eq!(detail.revision.map(|rev| rev.id), Some(newest.id));
        assert_eq!(detail.revisions.len(), 2);
    }
}
