use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{DependencyEntity, GameDepKind, PageEntity},
    dto::common::ChoiceItem,
    error::ServiceError,
    services::catalog_service::{load_page, modify_page},
    state::SharedState,
};

/// Select value standing for "track the newest published revision".
pub const LATEST_REVISION: &str = "latest";

/// Make page `name` depend on the dependency page `dep_id`, optionally pinned to `revision_id`.
///
/// Returns the target page so callers can report its name.
pub async fn create_dependency(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    dep_id: Uuid,
    revision_id: Option<Uuid>,
) -> Result<PageEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let target = store
        .find_page_by_id(dep_id)
        .await?
        .filter(|page| !page.deleted && page.kind == GameDepKind::Dependency)
        .ok_or_else(|| dependency_not_found(dep_id))?;

    if let Some(revision_id) = revision_id {
        if target.revision(revision_id).is_none() {
            return Err(ServiceError::NotFound(format!(
                "revision `{revision_id}` does not belong to `{}`",
                target.name
            )));
        }
    }

    modify_page(&store, kind, name, |page| {
        if page.id == target.id {
            return Err(ServiceError::InvalidInput(
                "a page cannot depend on itself".into(),
            ));
        }
        if page.dependency_on(target.id).is_some() {
            return Err(ServiceError::Conflict(format!(
                "`{name}` already depends on `{}`",
                target.name
            )));
        }

        page.dependencies.push(DependencyEntity {
            id: Uuid::new_v4(),
            page_id: target.id,
            revision_id,
        });
        Ok(())
    })
    .await?;

    info!(
        page = %name,
        dependency = %target.name,
        revision = ?revision_id,
        "dependency added"
    );
    Ok(target)
}

/// Dependency of page `name` on the dependency page `dep_id`.
pub async fn show_dependency(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    dep_id: Uuid,
) -> Result<DependencyEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    page.dependency_on(dep_id)
        .cloned()
        .ok_or_else(|| dependency_not_found(dep_id))
}

/// Remove the dependency on `dep_id`. Returns the name of the former target.
pub async fn delete_dependency(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    dep_id: Uuid,
) -> Result<String, ServiceError> {
    let store = state.require_catalog_store().await?;
    modify_page(&store, kind, name, |page| {
        let index = page
            .dependencies
            .iter()
            .position(|dep| dep.page_id == dep_id)
            .ok_or_else(|| dependency_not_found(dep_id))?;
        page.dependencies.remove(index);
        Ok(())
    })
    .await?;

    let target_name = store
        .find_page_by_id(dep_id)
        .await?
        .map(|target| target.name)
        .unwrap_or_else(|| dep_id.to_string());
    info!(page = %name, dependency = %target_name, "dependency deleted");
    Ok(target_name)
}

/// Dependency pages offering at least one published revision, labelled `"Display (name)"`.
pub async fn dependency_dropdown(state: &SharedState) -> Result<Vec<ChoiceItem>, ServiceError> {
    let store = state.require_catalog_store().await?;
    Ok(store
        .list_pages(GameDepKind::Dependency)
        .await?
        .into_iter()
        .filter(|page| page.latest_published().is_some())
        .map(|page| {
            ChoiceItem::new(
                page.id.to_string(),
                format!("{} ({})", page.display_name, page.name),
            )
        })
        .collect())
}

/// "Use Latest Version" followed by the published revisions of `dep_id`.
pub async fn revision_dropdown(
    state: &SharedState,
    dep_id: Uuid,
) -> Result<Vec<ChoiceItem>, ServiceError> {
    let store = state.require_catalog_store().await?;
    let target = store
        .find_page_by_id(dep_id)
        .await?
        .filter(|page| !page.deleted && page.kind == GameDepKind::Dependency)
        .ok_or_else(|| dependency_not_found(dep_id))?;

    let mut choices = vec![ChoiceItem::new(LATEST_REVISION, "Use Latest Version")];
    choices.extend(
        target
            .published_revisions()
            .map(|rev| ChoiceItem::new(rev.id.to_string(), rev.version_label())),
    );
    Ok(choices)
}

/// Turn a revision choice into an optional pin.
pub fn parse_revision_choice(choice: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    match choice.map(str::trim) {
        None | Some("") | Some(LATEST_REVISION) => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| ServiceError::InvalidInput(format!("`{raw}` is not a revision id"))),
    }
}

fn dependency_not_found(dep_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("dependency `{dep_id}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        attachment_service, catalog_service,
        test_support::{page_request, revision_request, state, upload, zip_with},
    };

    async fn published_dependency(state: &SharedState, name: &str) -> (Uuid, Uuid) {
        let page = catalog_service::create(state, GameDepKind::Dependency, page_request(name), "admin")
            .await
            .unwrap();
        let revision =
            catalog_service::create_revision(state, GameDepKind::Dependency, name, revision_request(1.0))
                .await
                .unwrap();
        attachment_service::create_binary(
            state,
            GameDepKind::Dependency,
            name,
            revision.id,
            "pi",
            "pi",
            upload("dep.zip", "application/zip", zip_with(&[format!("{name}/__init__.py").as_str()])),
        )
        .await
        .unwrap();
        catalog_service::flip_published(state, GameDepKind::Dependency, name, revision.id)
            .await
            .unwrap();
        (page.id, revision.id)
    }

    #[tokio::test]
    async fn add_show_and_delete_dependency() {
        let state = state();
        let (dep_id, revision_id) = published_dependency(&state, "pygame").await;
        catalog_service::create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let target = create_dependency(&state, GameDepKind::Game, "pong", dep_id, Some(revision_id))
            .await
            .unwrap();
        assert_eq!(target.name, "pygame");

        let dependency = show_dependency(&state, GameDepKind::Game, "pong", dep_id)
            .await
            .unwrap();
        assert_eq!(dependency.revision_id, Some(revision_id));

        let err = create_dependency(&state, GameDepKind::Game, "pong", dep_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let name = delete_dependency(&state, GameDepKind::Game, "pong", dep_id)
            .await
            .unwrap();
        assert_eq!(name, "pygame");
        assert!(matches!(
            show_dependency(&state, GameDepKind::Game, "pong", dep_id)
                .await
                .unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn invalid_targets_are_rejected() {
        let state = state();
        let (dep_id, _) = published_dependency(&state, "pygame").await;
        let (other_dep, other_revision) = published_dependency(&state, "numpy").await;
        let game = catalog_service::create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let err = create_dependency(&state, GameDepKind::Game, "pong", game.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = create_dependency(&state, GameDepKind::Game, "pong", dep_id, Some(other_revision))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = create_dependency(&state, GameDepKind::Dependency, "numpy", other_dep, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn dropdowns_only_offer_published_revisions() {
        let state = state();
        let (dep_id, revision_id) = published_dependency(&state, "pygame").await;
        catalog_service::create(&state, GameDepKind::Dependency, page_request("draft"), "admin")
            .await
            .unwrap();
        catalog_service::create_revision(&state, GameDepKind::Dependency, "pygame", revision_request(2.0))
            .await
            .unwrap();

        let deps = dependency_dropdown(&state).await.unwrap();
        assert_eq!(
            deps,
            vec![ChoiceItem::new(dep_id.to_string(), "PYGAME (pygame)")]
        );

        let revisions = revision_dropdown(&state, dep_id).await.unwrap();
        assert_eq!(
            revisions,
            vec![
                ChoiceItem::new(LATEST_REVISION, "Use Latest Version"),
                ChoiceItem::new(revision_id.to_string(), "1.0"),
            ]
        );
    }

    #[test]
    fn revision_choice_parsing() {
        assert_eq!(parse_revision_choice(None).unwrap(), None);
        assert_eq!(parse_revision_choice(Some("latest")).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(
            parse_revision_choice(Some(&id.to_string())).unwrap(),
            Some(id)
        );
        assert!(parse_revision_choice(Some("1.0")).is_err());
    }
}
