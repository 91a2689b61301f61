use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::gamedep::ApiPageResponse, error::AppError, routes::gamedep::parse_kind,
    services::catalog_service, state::SharedState,
};

/// Read-only machine API.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/gamedep/{type}/item/{page_id}", get(api_item))
}

/// A page with all its revisions keyed by version.
#[utoipa::path(
    get,
    path = "/api/gamedep/{type}/item/{page_id}",
    tag = "api",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("page_id" = String, Path, description = "Page name")
    ),
    responses(
        (status = 200, description = "Page with revisions", body = ApiPageResponse),
        (status = 404, description = "Page not found")
    )
)]
pub async fn api_item(
    State(state): State<SharedState>,
    Path((kind, page_id)): Path<(String, String)>,
) -> Result<Json<ApiPageResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(catalog_service::api_item(&state, kind, &page_id).await?))
}
