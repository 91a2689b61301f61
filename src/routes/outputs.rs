use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::output_service::{self, FileDownload},
    state::SharedState,
};

const FILE_CACHE_CONTROL: &str = "public, max-age=3600";

/// Catalog exports and file downloads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/outputs/json", get(show_json))
        .route("/outputs/xml", get(show_xml))
        .route("/outputs/file/{fileid}", get(show_file))
}

/// Every published revision, as JSON.
#[utoipa::path(
    get,
    path = "/outputs/json",
    tag = "outputs",
    responses(
        (status = 200, description = "Catalog export", body = crate::dto::output::CatalogExport, content_type = "application/json"),
        (status = 503, description = "Catalog store unavailable")
    )
)]
pub async fn show_json(State(state): State<SharedState>) -> Result<Response, AppError> {
    let body = output_service::show_json(&state).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Every published revision, as XML.
#[utoipa::path(
    get,
    path = "/outputs/xml",
    tag = "outputs",
    responses(
        (status = 200, description = "Catalog export", body = String, content_type = "application/xml"),
        (status = 503, description = "Catalog store unavailable")
    )
)]
pub async fn show_xml(State(state): State<SharedState>) -> Result<Response, AppError> {
    let body = output_service::show_xml(&state).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response())
}

/// Download an uploaded file. Honors `If-None-Match`.
#[utoipa::path(
    get,
    path = "/outputs/file/{fileid}",
    tag = "outputs",
    params(("fileid" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File content", body = String, content_type = "application/octet-stream"),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "File not found")
    )
)]
pub async fn show_file(
    State(state): State<SharedState>,
    Path(file_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());

    match output_service::show_file(&state, file_id, if_none_match).await? {
        FileDownload::NotModified { etag } => Ok((
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, quoted(&etag)),
                (header::CACHE_CONTROL, FILE_CACHE_CONTROL.to_owned()),
            ],
        )
            .into_response()),
        FileDownload::Content { etag, file } => {
            let content_type = HeaderValue::from_str(&file.mimetype)
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            let mut response = file.data.into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, content_type);
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(FILE_CACHE_CONTROL));
            if let Ok(value) = HeaderValue::from_str(&quoted(&etag)) {
                headers.insert(header::ETAG, value);
            }
            if let Ok(value) =
                HeaderValue::from_str(&format!("inline; filename=\"{}\"", file.name.replace('"', "")))
            {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            Ok(response)
        }
    }
}

fn quoted(etag: &str) -> String {
    format!("\"{etag}\"")
}
