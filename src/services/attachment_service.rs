//! Uploaded files hanging off pages: source archives, binaries and pictures.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        catalog_store::CatalogStore,
        models::{BinaryEntity, FileEntity, GameDepKind, LookupTable, PageEntity},
    },
    dto::{
        upload::UploadedFile,
        validation::{describe, validate_archive, validate_picture},
    },
    error::ServiceError,
    services::{
        catalog_service::{
            discard_files, load_page, modify_page, revision_mut, revision_not_found,
        },
        lookup_service::require_lookup,
    },
    state::SharedState,
};

/// Second half of an `editbin` request.
#[derive(Debug, Clone)]
pub enum BinaryEdit {
    /// Replace the stored artifact; the previous file is deleted.
    File(UploadedFile),
    /// Retarget the binary to another operating system and architecture.
    Platform {
        /// New `operatingsystems` lookup name.
        operating_system: String,
        /// New `architectures` lookup name.
        architecture: String,
    },
}

/// Attach a source archive to a game revision, replacing any previous one.
///
/// Returns the uploaded filename.
pub async fn create_source(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    upload: UploadedFile,
) -> Result<String, ServiceError> {
    if kind != GameDepKind::Game {
        return Err(ServiceError::NotFound(
            "source archives are only attached to games".into(),
        ));
    }

    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    let module_type = page
        .revision(revision_id)
        .ok_or_else(|| revision_not_found(name, revision_id))?
        .module_type;
    validate_archive(&upload.data, &module_type.required_entries(name))
        .map_err(|err| ServiceError::InvalidInput(describe(&err)))?;

    let filename = upload.filename.clone();
    let previous = attach_upload(&store, kind, name, upload, |page, file_id| {
        let revision = revision_mut(page, revision_id)?;
        if revision.module_type != module_type {
            return Err(ServiceError::Conflict(format!(
                "module type of revision `{revision_id}` changed during the upload"
            )));
        }
        Ok(revision.source_file.replace(file_id))
    })
    .await?;
    discard_files(&store, previous.into_iter().collect()).await;

    info!(page = %name, revision = %revision_id, file = %filename, "source uploaded");
    Ok(filename)
}

/// Attach a binary built for `operating_system`/`architecture` to a revision.
///
/// Dependency binaries must be zip archives holding the `{name}/` package folder.
pub async fn create_binary(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    operating_system: &str,
    architecture: &str,
    upload: UploadedFile,
) -> Result<BinaryEntity, ServiceError> {
    require_platform(state, operating_system, architecture).await?;
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    check_binary_upload(kind, name, &upload)?;
    if page.revision(revision_id).is_none() {
        return Err(revision_not_found(name, revision_id));
    }

    let filename = upload.filename.clone();
    let binary = attach_upload(&store, kind, name, upload, |page, file_id| {
        let binary = BinaryEntity {
            id: Uuid::new_v4(),
            file_id,
            operating_system: operating_system.to_owned(),
            architecture: architecture.to_owned(),
        };
        revision_mut(page, revision_id)?.binaries.push(binary.clone());
        Ok(binary)
    })
    .await?;

    info!(
        page = %name,
        revision = %revision_id,
        binary = %binary.id,
        file = %filename,
        operating_system,
        architecture,
        "binary added"
    );
    Ok(binary)
}

/// Apply `edit` to an existing binary. Returns the filename now attached to it.
pub async fn update_binary(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    binary_id: Uuid,
    edit: BinaryEdit,
) -> Result<String, ServiceError> {
    if let BinaryEdit::Platform {
        operating_system,
        architecture,
    } = &edit
    {
        require_platform(state, operating_system, architecture).await?;
    }

    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    if let BinaryEdit::File(upload) = &edit {
        check_binary_upload(kind, name, upload)?;
    }
    find_binary(&page, revision_id, binary_id)?;

    let filename = match edit {
        BinaryEdit::File(upload) => {
            let filename = upload.filename.clone();
            let previous = attach_upload(&store, kind, name, upload, |page, file_id| {
                let binary = find_binary_mut(page, revision_id, binary_id)?;
                Ok(std::mem::replace(&mut binary.file_id, file_id))
            })
            .await?;
            discard_files(&store, vec![previous]).await;
            filename
        }
        BinaryEdit::Platform {
            operating_system,
            architecture,
        } => {
            let (_, file_id) = modify_page(&store, kind, name, |page| {
                let binary = find_binary_mut(page, revision_id, binary_id)?;
                binary.operating_system.clone_from(&operating_system);
                binary.architecture.clone_from(&architecture);
                Ok(binary.file_id)
            })
            .await?;
            file_name(&store, file_id).await
        }
    };

    info!(page = %name, revision = %revision_id, binary = %binary_id, "binary updated");
    Ok(filename)
}

/// Detach a binary and delete its file. Returns the filename it carried.
pub async fn delete_binary(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    binary_id: Uuid,
) -> Result<String, ServiceError> {
    let store = state.require_catalog_store().await?;
    let (_, removed) = modify_page(&store, kind, name, |page| {
        let revision = revision_mut(page, revision_id)?;
        let index = revision
            .binaries
            .iter()
            .position(|binary| binary.id == binary_id)
            .ok_or_else(|| binary_not_found(binary_id))?;
        Ok(revision.binaries.remove(index))
    })
    .await?;
    let filename = file_name(&store, removed.file_id).await;
    discard_files(&store, vec![removed.file_id]).await;

    info!(page = %name, revision = %revision_id, binary = %binary_id, "binary deleted");
    Ok(filename)
}

/// Binary `binary_id` of revision `revision_id` on the live page `name`.
pub async fn show_binary(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    revision_id: Uuid,
    binary_id: Uuid,
) -> Result<BinaryEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    find_binary(&page, revision_id, binary_id).cloned()
}

/// Attach a picture to a page. Returns the stored file id.
pub async fn create_picture(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    upload: UploadedFile,
) -> Result<Uuid, ServiceError> {
    validate_picture(&upload.mimetype).map_err(|err| ServiceError::InvalidInput(describe(&err)))?;
    let store = state.require_catalog_store().await?;
    load_page(store.as_ref(), kind, name).await?;

    let filename = upload.filename.clone();
    let file_id = attach_upload(&store, kind, name, upload, |page, file_id| {
        page.pictures.push(file_id);
        Ok(file_id)
    })
    .await?;

    info!(page = %name, picture = %file_id, file = %filename, "picture added");
    Ok(file_id)
}

/// Stored file of a picture attached to the page.
pub async fn show_picture(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    picture_id: Uuid,
) -> Result<FileEntity, ServiceError> {
    let store = state.require_catalog_store().await?;
    let page = load_page(store.as_ref(), kind, name).await?;
    if !page.pictures.contains(&picture_id) {
        return Err(picture_not_found(picture_id));
    }
    store
        .find_file(picture_id)
        .await?
        .ok_or_else(|| picture_not_found(picture_id))
}

/// Detach a picture from the page and delete its file. Returns the filename.
pub async fn delete_picture(
    state: &SharedState,
    kind: GameDepKind,
    name: &str,
    picture_id: Uuid,
) -> Result<String, ServiceError> {
    let store = state.require_catalog_store().await?;
    modify_page(&store, kind, name, |page| {
        let index = page
            .pictures
            .iter()
            .position(|id| *id == picture_id)
            .ok_or_else(|| picture_not_found(picture_id))?;
        page.pictures.remove(index);
        Ok(())
    })
    .await?;
    let filename = file_name(&store, picture_id).await;
    discard_files(&store, vec![picture_id]).await;

    info!(page = %name, picture = %picture_id, "picture deleted");
    Ok(filename)
}

async fn require_platform(
    state: &SharedState,
    operating_system: &str,
    architecture: &str,
) -> Result<(), ServiceError> {
    require_lookup(state, LookupTable::OperatingSystems, operating_system).await?;
    require_lookup(state, LookupTable::Architectures, architecture).await?;
    Ok(())
}

fn check_binary_upload(
    kind: GameDepKind,
    name: &str,
    upload: &UploadedFile,
) -> Result<(), ServiceError> {
    if kind == GameDepKind::Dependency {
        validate_archive(&upload.data, &[format!("{name}/")])
            .map_err(|err| ServiceError::InvalidInput(describe(&err)))?;
    }
    Ok(())
}

fn find_binary(
    page: &PageEntity,
    revision_id: Uuid,
    binary_id: Uuid,
) -> Result<&BinaryEntity, ServiceError> {
    page.revision(revision_id)
        .ok_or_else(|| revision_not_found(&page.name, revision_id))?
        .binary(binary_id)
        .ok_or_else(|| binary_not_found(binary_id))
}

fn find_binary_mut(
    page: &mut PageEntity,
    revision_id: Uuid,
    binary_id: Uuid,
) -> Result<&mut BinaryEntity, ServiceError> {
    revision_mut(page, revision_id)?
        .binary_mut(binary_id)
        .ok_or_else(|| binary_not_found(binary_id))
}

/// Store `upload`, then link it into the page with `attach`.
///
/// The stored file is deleted again when the page write fails.
async fn attach_upload<T>(
    store: &Arc<dyn CatalogStore>,
    kind: GameDepKind,
    name: &str,
    upload: UploadedFile,
    mut attach: impl FnMut(&mut PageEntity, Uuid) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let file = FileEntity::new(upload.filename, upload.mimetype, upload.data);
    let file_id = file.id;
    store.insert_file(file).await?;

    match modify_page(store, kind, name, |page| attach(page, file_id)).await {
        Ok((_, outcome)) => Ok(outcome),
        Err(err) => {
            discard_files(store, vec![file_id]).await;
            Err(err)
        }
    }
}

async fn file_name(store: &Arc<dyn CatalogStore>, file_id: Uuid) -> String {
    match store.find_file(file_id).await {
        Ok(Some(file)) => file.name,
        Ok(None) => file_id.to_string(),
        Err(err) => {
            warn!(file = %file_id, error = %err, "failed to read file metadata");
            file_id.to_string()
        }
    }
}

fn binary_not_found(binary_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("binary `{binary_id}` not found"))
}

fn picture_not_found(picture_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("picture `{picture_id}` not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::gamedep::RevisionRequest,
        services::{
            catalog_service,
            test_support::{page_request, revision_request, state, upload, zip_with},
        },
    };

    async fn seed(state: &SharedState, kind: GameDepKind, name: &str) -> Uuid {
        catalog_service::create(state, kind, page_request(name), "admin")
            .await
            .unwrap();
        catalog_service::create_revision(state, kind, name, revision_request(0.1))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn source_requires_module_entry_point() {
        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;

        let err = create_source(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            upload("src.zip", "application/zip", zip_with(&["pong/__init__.py"])),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidInput(ref msg) if msg == "The zip must have the following files: pong/pong.py")
        );

        let filename = create_source(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            upload("src.zip", "application/zip", zip_with(&["pong/pong.py"])),
        )
        .await
        .unwrap();
        assert_eq!(filename, "src.zip");

        let revision = catalog_service::flip_published(&state, GameDepKind::Game, "pong", revision)
            .await
            .unwrap();
        assert!(revision.published);
    }

    #[tokio::test]
    async fn folder_module_needs_init_file() {
        let state = state();
        catalog_service::create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let revision = catalog_service::create_revision(
            &state,
            GameDepKind::Game,
            "pong",
            RevisionRequest {
                version: 1.0,
                module_type: "folder".into(),
            },
        )
        .await
        .unwrap();

        assert!(
            create_source(
                &state,
                GameDepKind::Game,
                "pong",
                revision.id,
                upload("src.zip", "application/zip", zip_with(&["pong/__init__.py"])),
            )
            .await
            .is_ok()
        );
    }

    #[tokio::test]
    async fn replacing_source_deletes_previous_file() {
        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;
        let archive = zip_with(&["pong/pong.py"]);

        create_source(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            upload("v1.zip", "application/zip", archive.clone()),
        )
        .await
        .unwrap();
        let (_, first) = catalog_service::show(&state, GameDepKind::Game, "pong", Some(revision), true)
            .await
            .unwrap();
        let first_file = first.and_then(|rev| rev.source_file).unwrap();

        create_source(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            upload("v2.zip", "application/zip", archive),
        )
        .await
        .unwrap();

        let store = state.require_catalog_store().await.unwrap();
        assert!(store.find_file(first_file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sources_are_rejected_for_dependencies() {
        let state = state();
        let revision = seed(&state, GameDepKind::Dependency, "pygame").await;
        let err = create_source(
            &state,
            GameDepKind::Dependency,
            "pygame",
            revision,
            upload("src.zip", "application/zip", zip_with(&["pygame/pygame.py"])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn dependency_binaries_must_contain_package_folder() {
        let state = state();
        let revision = seed(&state, GameDepKind::Dependency, "pygame").await;

        let err = create_binary(
            &state,
            GameDepKind::Dependency,
            "pygame",
            revision,
            "lin",
            "x86_64",
            upload("bin.zip", "application/zip", zip_with(&["other/file.so"])),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let binary = create_binary(
            &state,
            GameDepKind::Dependency,
            "pygame",
            revision,
            "lin",
            "x86_64",
            upload("bin.zip", "application/zip", zip_with(&["pygame/core.so"])),
        )
        .await
        .unwrap();
        assert_eq!(binary.operating_system, "lin");
        assert_eq!(
            show_binary(&state, GameDepKind::Dependency, "pygame", revision, binary.id)
                .await
                .unwrap(),
            binary
        );

        let revision =
            catalog_service::flip_published(&state, GameDepKind::Dependency, "pygame", revision)
                .await
                .unwrap();
        assert!(revision.published);
    }

    #[tokio::test]
    async fn binaries_need_known_platforms() {
        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;
        let err = create_binary(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            "amiga",
            "x86_64",
            upload("pong.exe", "application/octet-stream", b"MZ".to_vec()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_and_delete_binary() {
        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;
        let binary = create_binary(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            "win",
            "i386",
            upload("pong.exe", "application/octet-stream", b"MZ".to_vec()),
        )
        .await
        .unwrap();

        let filename = update_binary(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            binary.id,
            BinaryEdit::Platform {
                operating_system: "win".into(),
                architecture: "x86_64".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(filename, "pong.exe");
        assert_eq!(
            show_binary(&state, GameDepKind::Game, "pong", revision, binary.id)
                .await
                .unwrap()
                .architecture,
            "x86_64"
        );

        let filename = update_binary(
            &state,
            GameDepKind::Game,
            "pong",
            revision,
            binary.id,
            BinaryEdit::File(upload(
                "pong64.exe",
                "application/octet-stream",
                b"MZ64".to_vec(),
            )),
        )
        .await
        .unwrap();
        assert_eq!(filename, "pong64.exe");
        let store = state.require_catalog_store().await.unwrap();
        assert!(store.find_file(binary.file_id).await.unwrap().is_none());

        let filename = delete_binary(&state, GameDepKind::Game, "pong", revision, binary.id)
            .await
            .unwrap();
        assert_eq!(filename, "pong64.exe");
        assert!(matches!(
            show_binary(&state, GameDepKind::Game, "pong", revision, binary.id)
                .await
                .unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn show_binary_is_scoped_to_page_and_revision() {
        let state = state();
        let pong_rev = seed(&state, GameDepKind::Game, "pong").await;
        let tetris_rev = seed(&state, GameDepKind::Game, "tetris").await;
        let binary = create_binary(
            &state,
            GameDepKind::Game,
            "pong",
            pong_rev,
            "win",
            "i386",
            upload("pong.exe", "application/octet-stream", b"MZ".to_vec()),
        )
        .await
        .unwrap();

        let err = show_binary(&state, GameDepKind::Game, "tetris", tetris_rev, binary.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = show_binary(&state, GameDepKind::Game, "tetris", pong_rev, binary.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = show_binary(&state, GameDepKind::Dependency, "pong", pong_rev, binary.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let other_rev =
            catalog_service::create_revision(&state, GameDepKind::Game, "pong", revision_request(0.2))
                .await
                .unwrap();
        let err = show_binary(&state, GameDepKind::Game, "pong", other_rev.id, binary.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_binary_uploads_are_not_lost() {
        const UPLOADS: usize = 64;

        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;
        let barrier = Arc::new(tokio::sync::Barrier::new(UPLOADS));

        let tasks: Vec<_> = (0..UPLOADS)
            .map(|n| {
                let state = state.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    create_binary(
                        &state,
                        GameDepKind::Game,
                        "pong",
                        revision,
                        "win",
                        "x86_64",
                        upload(
                            &format!("pong{n}.exe"),
                            "application/octet-stream",
                            vec![n as u8],
                        ),
                    )
                    .await
                })
            })
            .collect();

        let mut created = Vec::new();
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(binary) => created.push(binary),
                Err(ServiceError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created.len() + conflicts, UPLOADS);
        assert!(!created.is_empty());

        let (_, stored) =
            catalog_service::show(&state, GameDepKind::Game, "pong", Some(revision), true)
                .await
                .unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.binaries.len(), created.len());

        let store = state.require_catalog_store().await.unwrap();
        for binary in &created {
            assert_eq!(stored.binary(binary.id), Some(binary));
            assert!(store.find_file(binary.file_id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn failed_attach_discards_uploaded_file() {
        let state = state();
        let revision = seed(&state, GameDepKind::Game, "pong").await;
        let store = state.require_catalog_store().await.unwrap();

        let mut stored_file = None;
        let err = attach_upload(
            &store,
            GameDepKind::Game,
            "pong",
            upload("pong.exe", "application/octet-stream", b"MZ".to_vec()),
            |_, file_id| {
                stored_file = Some(file_id);
                Err::<(), _>(revision_not_found("pong", revision))
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let file_id = stored_file.unwrap();
        assert!(store.find_file(file_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pictures_round_trip() {
        let state = state();
        catalog_service::create(&state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();

        let err = create_picture(
            &state,
            GameDepKind::Game,
            "pong",
            upload("shot.zip", "application/zip", vec![1]),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidInput(ref msg) if msg == "The uploaded file is not a picture.")
        );

        let picture = create_picture(
            &state,
            GameDepKind::Game,
            "pong",
            upload("shot.png", "image/png", vec![0x89, 0x50]),
        )
        .await
        .unwrap();
        let file = show_picture(&state, GameDepKind::Game, "pong", picture)
            .await
            .unwrap();
        assert_eq!(file.name, "shot.png");

        let filename = delete_picture(&state, GameDepKind::Game, "pong", picture)
            .await
            .unwrap();
        assert_eq!(filename, "shot.png");
        assert!(matches!(
            show_picture(&state, GameDepKind::Game, "pong", picture)
                .await
                .unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
