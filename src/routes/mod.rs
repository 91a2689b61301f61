use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{error::AppError, state::SharedState};

/// JSON API over the catalog.
pub mod api;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Catalog editing and browsing.
pub mod gamedep;
/// Liveness endpoint.
pub mod health;
/// Catalog export and file downloads.
pub mod outputs;
/// Multipart form parsing.
pub mod upload;
/// Voting endpoints.
pub mod vote;

const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Identity supplied by the upstream authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(gamedep::router(state.clone()))
        .merge(outputs::router())
        .merge(api::router())
        .merge(vote::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Reject requests without an `X-Remote-User` header and expose the user to handlers.
pub(crate) async fn require_user(
    State(_state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .headers()
        .get(REMOTE_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("missing X-Remote-User header".into()))?;

    debug!(%user, path = %req.uri().path(), "authenticated request");
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
