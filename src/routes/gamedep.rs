use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dao::models::{GameDepKind, format_version},
    dto::{
        common::{ActionResponse, ChoiceItem, LookupItem},
        gamedep::{
            BinarySummary, DependencyRequest, EditPageRequest, PageDetail, PageListResponse,
            PictureSummary, RevisionRequest,
        },
        upload::{BinaryUploadForm, FileUploadForm},
    },
    error::AppError,
    routes::{CurrentUser, require_user, upload::UploadForm},
    services::{
        attachment_service::{self, BinaryEdit},
        catalog_service, dependency_service, lookup_service,
    },
    state::SharedState,
};

const EDIT_BINARY_FILE: &str = "1";
const EDIT_BINARY_PLATFORM: &str = "2";

/// Catalog routes. Everything but the read-only views requires an identified user.
pub fn router(state: SharedState) -> Router<SharedState> {
    let reads = Router::new()
        .route("/gamedep/lookups/{table}", get(list_lookups))
        .route("/gamedep/{type}/list", get(list_pages))
        .route("/gamedep/{type}/item/{page_id}", get(show_page))
        .route("/gamedep/{type}/item/{page_id}/{revision}", get(show_page_revision))
        .route("/gamedep/{type}/picture/{page_id}/{pic_id}", get(show_picture))
        .route("/gamedep/{type}/adddep/{page_id}", get(dependency_choices))
        .route(
            "/gamedep/{type}/adddep/{page_id}/{depid}",
            get(revision_choices),
        )
        .route(
            "/gamedep/{type}/editbin/{page_id}/{revision}/{binary_id}/{edittype}",
            get(show_binary),
        );

    let writes = Router::new()
        .route("/gamedep/{type}/edit/{page_id}", post(edit_page))
        .route("/gamedep/{type}/delete/{page_id}", post(delete_page))
        .route(
            "/gamedep/{type}/published/{page_id}/{revision}",
            post(flip_published),
        )
        .route(
            "/gamedep/{type}/edit_revision/{page_id}",
            post(create_revision),
        )
        .route(
            "/gamedep/{type}/edit_revision/{page_id}/{revision}",
            post(update_revision),
        )
        .route(
            "/gamedep/{type}/delete_revision/{page_id}/{revision}",
            post(delete_revision),
        )
        .route("/gamedep/{type}/addsrc/{page_id}/{revision}", post(add_source))
        .route("/gamedep/{type}/addbin/{page_id}/{revision}", post(add_binary))
        .route(
            "/gamedep/{type}/editbin/{page_id}/{revision}/{binary_id}/{edittype}",
            post(edit_binary),
        )
        .route(
            "/gamedep/{type}/delbin/{page_id}/{revision}/{binary_id}",
            post(delete_binary),
        )
        .route(
            "/gamedep/{type}/adddep/{page_id}/{depid}",
            post(add_dependency),
        )
        .route(
            "/gamedep/{type}/deldep/{page_id}/{depid}",
            post(delete_dependency),
        )
        .route("/gamedep/{type}/addpic/{page_id}", post(add_picture))
        .route(
            "/gamedep/{type}/delpic/{page_id}/{pic_id}",
            post(delete_picture),
        )
        .route_layer(middleware::from_fn_with_state(state, require_user));

    reads.merge(writes)
}

/// Resolve the `{type}` segment; anything but `games`/`dependencies` is a 404.
pub(crate) fn parse_kind(segment: &str) -> Result<GameDepKind, AppError> {
    GameDepKind::from_route(segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown catalog type `{segment}`")))
}

fn check_edit_type(edittype: &str) -> Result<(), AppError> {
    match edittype {
        EDIT_BINARY_FILE | EDIT_BINARY_PLATFORM => Ok(()),
        _ => Err(invalid_edit_type()),
    }
}

fn invalid_edit_type() -> AppError {
    AppError::BadRequest("Invalid Binary ID and/or Edit Type.".into())
}

fn done(message: String) -> Json<ActionResponse> {
    Json(ActionResponse::new(message))
}

/// List a lookup table (`operatingsystems`, `architectures`, `moduletypes`).
#[utoipa::path(
    get,
    path = "/gamedep/lookups/{table}",
    tag = "gamedep",
    params(("table" = String, Path, description = "Lookup table name")),
    responses(
        (status = 200, description = "Lookup rows in display order", body = [LookupItem]),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn list_lookups(
    State(state): State<SharedState>,
    Path(table): Path<String>,
) -> Result<Json<Vec<LookupItem>>, AppError> {
    Ok(Json(lookup_service::list_lookup_items(&state, &table).await?))
}

/// List live page names of one kind.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/list",
    tag = "gamedep",
    params(("type" = String, Path, description = "`games` or `dependencies`")),
    responses((status = 200, description = "Sorted page names", body = PageListResponse))
)]
pub async fn list_pages(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
) -> Result<Json<PageListResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let pages = catalog_service::list(&state, kind).await?;
    Ok(Json(PageListResponse { pages }))
}

/// Show a page with its newest revision.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/item/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name")
    ),
    responses(
        (status = 200, description = "Page details", body = PageDetail),
        (status = 404, description = "Page not found")
    )
)]
pub async fn show_page(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
) -> Result<Json<PageDetail>, AppError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(
        catalog_service::page_detail(&state, kind, &page_id, None).await?,
    ))
}

/// Show a page with a specific revision selected.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/item/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id")
    ),
    responses(
        (status = 200, description = "Page details", body = PageDetail),
        (status = 404, description = "Page or revision not found")
    )
)]
pub async fn show_page_revision(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
) -> Result<Json<PageDetail>, AppError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(
        catalog_service::page_detail(&state, kind, &page_id, Some(revision)).await?,
    ))
}

/// Create the page when it does not exist yet, update it otherwise.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/edit/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Current page name"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body = EditPageRequest,
    responses(
        (status = 200, description = "Page updated", body = ActionResponse),
        (status = 201, description = "Page created", body = ActionResponse),
        (status = 400, description = "Invalid form"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn edit_page(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path((kind, page_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<EditPageRequest>>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    let kind = parse_kind(&kind)?;
    let (page, created) =
        catalog_service::edit_page(&state, kind, &page_id, payload, &user.0).await?;
    if created {
        Ok((
            StatusCode::CREATED,
            done(format!("The page ({}) has been created.", page.name)),
        ))
    } else {
        Ok((
            StatusCode::OK,
            done(format!("The page ({}) has been updated.", page.name)),
        ))
    }
}

/// Soft delete a page.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/delete/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Page deleted", body = ActionResponse),
        (status = 404, description = "Page not found")
    )
)]
pub async fn delete_page(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    catalog_service::delete(&state, kind, &page_id).await?;
    Ok(done(format!("The page ({page_id}) has been deleted.")))
}

/// Toggle the published flag of a revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/published/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Flag toggled", body = ActionResponse),
        (status = 409, description = "Source or binary missing")
    )
)]
pub async fn flip_published(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let revision = catalog_service::flip_published(&state, kind, &page_id, revision).await?;
    let status = if revision.published {
        "published"
    } else {
        "unpublished"
    };
    Ok(done(format!(
        "Version {} of {page_id} has been {status}.",
        revision.version_label()
    )))
}

/// Add a revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/edit_revision/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body = RevisionRequest,
    responses(
        (status = 201, description = "Revision created", body = ActionResponse),
        (status = 409, description = "Version already exists")
    )
)]
pub async fn create_revision(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<RevisionRequest>>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    let kind = parse_kind(&kind)?;
    let (revision, _) =
        catalog_service::edit_revision(&state, kind, &page_id, None, payload).await?;
    Ok((
        StatusCode::CREATED,
        done(format!(
            "A new version ({}) has been created for {page_id}.",
            revision.version_label()
        )),
    ))
}

/// Change the version and module type of a revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/edit_revision/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body = RevisionRequest,
    responses(
        (status = 200, description = "Revision updated", body = ActionResponse),
        (status = 404, description = "Revision not found")
    )
)]
pub async fn update_revision(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
    Valid(Json(payload)): Valid<Json<RevisionRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let (revision, _) =
        catalog_service::edit_revision(&state, kind, &page_id, Some(revision), payload).await?;
    Ok(done(format!(
        "A new version ({}) has been updated for {page_id}.",
        revision.version_label()
    )))
}

/// Remove a revision and its files.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/delete_revision/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Revision deleted", body = ActionResponse),
        (status = 404, description = "Revision not found")
    )
)]
pub async fn delete_revision(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let removed = catalog_service::delete_revision(&state, kind, &page_id, revision).await?;
    Ok(done(format!(
        "Version ({}) of {page_id} has been deleted.",
        format_version(removed.version)
    )))
}

/// Upload the source archive of a game revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/addsrc/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "Only `games`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Source stored", body = ActionResponse),
        (status = 400, description = "Not a zip or missing entry point"),
        (status = 404, description = "Not a game or revision not found")
    )
)]
pub async fn add_source(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    if kind != GameDepKind::Game {
        return Err(AppError::NotFound(
            "source archives are only attached to games".into(),
        ));
    }
    let upload = UploadForm::from_multipart(multipart).await?.take_file()?;
    let filename =
        attachment_service::create_source(&state, kind, &page_id, revision, upload).await?;
    Ok(done(format!(
        "The source code ({filename}) has been successfully uploaded."
    )))
}

/// Attach a binary to a revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/addbin/{page_id}/{revision}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body(content = BinaryUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Binary stored", body = ActionResponse),
        (status = 400, description = "Invalid archive or platform")
    )
)]
pub async fn add_binary(
    State(state): State<SharedState>,
    Path((kind, page_id, revision)): Path<(String, String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let mut form = UploadForm::from_multipart(multipart).await?;
    let upload = form.take_file()?;
    let filename = upload.filename.clone();
    attachment_service::create_binary(
        &state,
        kind,
        &page_id,
        revision,
        form.field("operating_system")?,
        form.field("architecture")?,
        upload,
    )
    .await?;
    Ok(done(format!("Your binary ({filename}) has been added.")))
}

/// Current state of a binary, used to prefill the edit forms.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/editbin/{page_id}/{revision}/{binary_id}/{edittype}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("binary_id" = Uuid, Path, description = "Binary id"),
        ("edittype" = String, Path, description = "`1` file, `2` platform")
    ),
    responses(
        (status = 200, description = "Binary details", body = BinarySummary),
        (status = 400, description = "Invalid edit type"),
        (status = 404, description = "Page, revision or binary not found")
    )
)]
pub async fn show_binary(
    State(state): State<SharedState>,
    Path((kind, page_id, revision, binary_id, edittype)): Path<(
        String,
        String,
        Uuid,
        Uuid,
        String,
    )>,
) -> Result<Json<BinarySummary>, AppError> {
    let kind = parse_kind(&kind)?;
    check_edit_type(&edittype)?;
    let binary =
        attachment_service::show_binary(&state, kind, &page_id, revision, binary_id).await?;
    let config = state.config();
    Ok(Json(BinarySummary::from_entity(&binary, |id| {
        config.file_url(id)
    })))
}

/// Replace the file of a binary (`edittype` 1) or retarget it (`edittype` 2).
#[utoipa::path(
    post,
    path = "/gamedep/{type}/editbin/{page_id}/{revision}/{binary_id}/{edittype}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("binary_id" = Uuid, Path, description = "Binary id"),
        ("edittype" = String, Path, description = "`1` file, `2` platform"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body(content = BinaryUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Binary updated", body = ActionResponse),
        (status = 400, description = "Invalid edit type or form")
    )
)]
pub async fn edit_binary(
    State(state): State<SharedState>,
    Path((kind, page_id, revision, binary_id, edittype)): Path<(
        String,
        String,
        Uuid,
        Uuid,
        String,
    )>,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let mut form = UploadForm::from_multipart(multipart).await?;
    let edit = match edittype.as_str() {
        EDIT_BINARY_FILE => BinaryEdit::File(form.take_file()?),
        EDIT_BINARY_PLATFORM => BinaryEdit::Platform {
            operating_system: form.field("operating_system")?.to_owned(),
            architecture: form.field("architecture")?.to_owned(),
        },
        _ => return Err(invalid_edit_type()),
    };
    let filename =
        attachment_service::update_binary(&state, kind, &page_id, revision, binary_id, edit)
            .await?;
    Ok(done(format!("Your binary ({filename}) has been updated.")))
}

/// Remove a binary.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/delbin/{page_id}/{revision}/{binary_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("revision" = Uuid, Path, description = "Revision id"),
        ("binary_id" = Uuid, Path, description = "Binary id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Binary deleted", body = ActionResponse),
        (status = 404, description = "Binary not found")
    )
)]
pub async fn delete_binary(
    State(state): State<SharedState>,
    Path((kind, page_id, revision, binary_id)): Path<(String, String, Uuid, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let filename =
        attachment_service::delete_binary(&state, kind, &page_id, revision, binary_id).await?;
    Ok(done(format!("Your binary ({filename}) has been deleted.")))
}

/// Dependency pages that can be added.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/adddep/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name")
    ),
    responses((status = 200, description = "Dependency choices", body = [ChoiceItem]))
)]
pub async fn dependency_choices(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
) -> Result<Json<Vec<ChoiceItem>>, AppError> {
    let kind = parse_kind(&kind)?;
    let (page, _) = catalog_service::show(&state, kind, &page_id, None, false).await?;
    let choices = dependency_service::dependency_dropdown(&state)
        .await?
        .into_iter()
        .filter(|choice| choice.value != page.id.to_string())
        .collect();
    Ok(Json(choices))
}

/// Revisions a dependency can be pinned to.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/adddep/{page_id}/{depid}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("depid" = Uuid, Path, description = "Dependency page id")
    ),
    responses((status = 200, description = "Revision choices", body = [ChoiceItem]))
)]
pub async fn revision_choices(
    State(state): State<SharedState>,
    Path((kind, _page_id, dep_id)): Path<(String, String, Uuid)>,
) -> Result<Json<Vec<ChoiceItem>>, AppError> {
    parse_kind(&kind)?;
    Ok(Json(
        dependency_service::revision_dropdown(&state, dep_id).await?,
    ))
}

/// Depend on another page, optionally pinned to a revision.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/adddep/{page_id}/{depid}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("depid" = Uuid, Path, description = "Dependency page id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body(content = DependencyRequest, description = "Optional; an empty body tracks the latest revision"),
    responses(
        (status = 200, description = "Dependency added", body = ActionResponse),
        (status = 404, description = "Dependency or revision not found"),
        (status = 409, description = "Dependency already present")
    )
)]
pub async fn add_dependency(
    State(state): State<SharedState>,
    Path((kind, page_id, dep_id)): Path<(String, String, Uuid)>,
    payload: Option<Json<DependencyRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let revision = dependency_service::parse_revision_choice(payload.revision.as_deref())?;
    let target =
        dependency_service::create_dependency(&state, kind, &page_id, dep_id, revision).await?;
    Ok(done(format!(
        "Your dependency ({}) has been added.",
        target.name
    )))
}

/// Drop a dependency.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/deldep/{page_id}/{depid}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("depid" = Uuid, Path, description = "Dependency page id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Dependency deleted", body = ActionResponse),
        (status = 404, description = "Dependency not found")
    )
)]
pub async fn delete_dependency(
    State(state): State<SharedState>,
    Path((kind, page_id, dep_id)): Path<(String, String, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let name = dependency_service::delete_dependency(&state, kind, &page_id, dep_id).await?;
    Ok(done(format!("Your dependency ({name}) has been deleted.")))
}

/// Metadata of an attached picture.
#[utoipa::path(
    get,
    path = "/gamedep/{type}/picture/{page_id}/{pic_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("pic_id" = Uuid, Path, description = "Picture id")
    ),
    responses(
        (status = 200, description = "Picture metadata", body = PictureSummary),
        (status = 404, description = "Picture not found")
    )
)]
pub async fn show_picture(
    State(state): State<SharedState>,
    Path((kind, page_id, pic_id)): Path<(String, String, Uuid)>,
) -> Result<Json<PictureSummary>, AppError> {
    let kind = parse_kind(&kind)?;
    let file = attachment_service::show_picture(&state, kind, &page_id, pic_id).await?;
    Ok(Json(PictureSummary {
        id: file.id,
        url: state.config().file_url(file.id),
        name: file.name,
        mimetype: file.mimetype,
        size: file.size,
    }))
}

/// Attach a picture to a page.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/addpic/{page_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture added", body = ActionResponse),
        (status = 400, description = "Not a picture")
    )
)]
pub async fn add_picture(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let upload = UploadForm::from_multipart(multipart).await?.take_file()?;
    let filename = upload.filename.clone();
    attachment_service::create_picture(&state, kind, &page_id, upload).await?;
    Ok(done(format!("Your picture ({filename}) has been added.")))
}

/// Remove a picture.
#[utoipa::path(
    post,
    path = "/gamedep/{type}/delpic/{page_id}/{pic_id}",
    tag = "gamedep",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name"),
        ("pic_id" = Uuid, Path, description = "Picture id"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Picture deleted", body = ActionResponse),
        (status = 404, description = "Picture not found")
    )
)]
pub async fn delete_picture(
    State(state): State<SharedState>,
    Path((kind, page_id, pic_id)): Path<(String, String, Uuid)>,
) -> Result<Json<ActionResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let filename = attachment_service::delete_picture(&state, kind, &page_id, pic_id).await?;
    Ok(done(format!("Your picture ({filename}) has been deleted.")))
}
