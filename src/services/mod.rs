/// Uploaded sources, binaries and pictures.
pub mod attachment_service;
/// Page and revision management.
pub mod catalog_service;
/// Links between pages and dependency packages.
pub mod dependency_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Static lookup tables.
pub mod lookup_service;
/// Catalog export and file downloads.
pub mod output_service;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
/// Likes and dislikes.
pub mod vote_service;
