use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::post,
};

use crate::{
    dto::gamedep::VoteSummary,
    error::AppError,
    routes::{CurrentUser, gamedep::parse_kind, require_user},
    services::vote_service,
    state::SharedState,
};

/// Voting endpoints; every vote is tied to the requesting user.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/vote/gamedep/{type}/{vote_id}/{like}", post(add_vote))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// Like (`true`) or dislike (anything else) a page. One vote per user and page.
#[utoipa::path(
    post,
    path = "/vote/gamedep/{type}/{vote_id}/{like}",
    tag = "vote",
    params(
        ("type" = String, Path, description = "`games` or `dependencies`"),
        ("vote_id" = String, Path, description = "Page name"),
        ("like" = String, Path, description = "`true` to like"),
        ("X-Remote-User" = String, Header, description = "Authenticated user")
    ),
    responses(
        (status = 200, description = "Vote recorded; current tally", body = VoteSummary),
        (status = 401, description = "No authenticated user"),
        (status = 409, description = "User already voted")
    )
)]
pub async fn add_vote(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path((kind, page_id, like)): Path<(String, String, String)>,
) -> Result<Json<VoteSummary>, AppError> {
    let kind = parse_kind(&kind)?;
    let like = vote_service::parse_like(&like);
    let tally = vote_service::add_vote(&state, kind, &page_id, &user.0, like).await?;
    Ok(Json(tally.into()))
}
