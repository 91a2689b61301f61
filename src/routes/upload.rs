use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{dto::upload::UploadedFile, error::AppError};

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Multipart form split into its (first) file part and plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain `multipart`; parts carrying a filename are files, the rest are text.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::BadRequest(format!("malformed multipart body: {err}")))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let mimetype = field
                        .content_type()
                        .unwrap_or(DEFAULT_MIMETYPE)
                        .to_owned();
                    let data = field.bytes().await.map_err(|err| {
                        AppError::BadRequest(format!("failed to read `{name}`: {err}"))
                    })?;
                    if form.file.is_none() {
                        form.file = Some(UploadedFile {
                            filename,
                            mimetype,
                            data: data.to_vec(),
                        });
                    }
                }
                None => {
                    let value = field.text().await.map_err(|err| {
                        AppError::BadRequest(format!("failed to read `{name}`: {err}"))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// The uploaded file, required.
    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("a file upload is required".into()))
    }

    /// Text field `name`, required.
    pub fn field(&self, name: &str) -> Result<&str, AppError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::BadRequest(format!("missing form field `{name}`")))
    }
}
