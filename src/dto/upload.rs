//! Multipart payloads accepted by the attachment routes.

use utoipa::ToSchema;

/// A file extracted from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename sent by the client.
    pub filename: String,
    /// Content type sent by the client.
    pub mimetype: String,
    /// File contents.
    pub data: Vec<u8>,
}

/// Multipart body of source and picture uploads.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct FileUploadForm {
    /// Uploaded file.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Multipart body of binary uploads.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct BinaryUploadForm {
    /// Built artifact.
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Name of an `operatingsystems` lookup row.
    pub operating_system: String,
    /// Name of an `architectures` lookup row.
    pub architecture: String,
}
