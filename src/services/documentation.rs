use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Hypernucleus server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::gamedep::list_lookups,
        crate::routes::gamedep::list_pages,
        crate::routes::gamedep::show_page,
        crate::routes::gamedep::show_page_revision,
        crate::routes::gamedep::edit_page,
        crate::routes::gamedep::delete_page,
        crate::routes::gamedep::flip_published,
        crate::routes::gamedep::create_revision,
        crate::routes::gamedep::update_revision,
        crate::routes::gamedep::delete_revision,
        crate::routes::gamedep::add_source,
        crate::routes::gamedep::add_binary,
        crate::routes::gamedep::show_binary,
        crate::routes::gamedep::edit_binary,
        crate::routes::gamedep::delete_binary,
        crate::routes::gamedep::dependency_choices,
        crate::routes::gamedep::revision_choices,
        crate::routes::gamedep::add_dependency,
        crate::routes::gamedep::delete_dependency,
        crate::routes::gamedep::show_picture,
        crate::routes::gamedep::add_picture,
        crate::routes::gamedep::delete_picture,
        crate::routes::outputs::show_json,
        crate::routes::outputs::show_xml,
        crate::routes::outputs::show_file,
        crate::routes::api::api_item,
        crate::routes::vote::add_vote,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::common::ActionResponse,
            crate::dto::common::ChoiceItem,
            crate::dto::common::LookupItem,
            crate::dto::gamedep::EditPageRequest,
            crate::dto::gamedep::RevisionRequest,
            crate::dto::gamedep::DependencyRequest,
            crate::dto::gamedep::PageListResponse,
            crate::dto::gamedep::FileRef,
            crate::dto::gamedep::BinarySummary,
            crate::dto::gamedep::RevisionSummary,
            crate::dto::gamedep::DependencySummary,
            crate::dto::gamedep::PictureSummary,
            crate::dto::gamedep::VoteSummary,
            crate::dto::gamedep::PageDetail,
            crate::dto::gamedep::ApiPageResponse,
            crate::dto::upload::FileUploadForm,
            crate::dto::upload::BinaryUploadForm,
            crate::dto::output::CatalogExport,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "gamedep", description = "Game and dependency pages, revisions and attachments"),
        (name = "outputs", description = "Catalog exports and file downloads"),
        (name = "api", description = "Read-only machine API"),
        (name = "vote", description = "Likes and dislikes"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_catalog_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/gamedep/{type}/edit/{page_id}",
            "/outputs/file/{fileid}",
            "/vote/gamedep/{type}/{vote_id}/{like}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
