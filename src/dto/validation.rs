//! Validation helpers for DTOs and uploaded archives.

use std::io::Cursor;

use indexmap::IndexSet;
use validator::ValidationError;
use zip::ZipArchive;

/// Validates that a page name only uses `a-z A-Z 0-9 _` and is not empty.
///
/// # Examples
///
/// ```ignore
/// validate_page_name("Space_Invaders2") // Ok
/// validate_page_name("space invaders")  // Err - whitespace
/// validate_page_name("")                // Err - empty
/// ```
pub fn validate_page_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("page_name_empty");
        err.message = Some("A name is required.".into());
        return Err(err);
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        let mut err = ValidationError::new("page_name_format");
        err.message = Some("Only characters a-z A-Z 0-9 _ are accepted.".into());
        return Err(err);
    }

    Ok(())
}

/// Checks that `data` is a zip archive containing every entry of `required`.
///
/// An entry ending in `/` names a folder and is satisfied by any member stored
/// under it, whether or not the archive carries an explicit directory record.
pub fn validate_archive(data: &[u8], required: &[String]) -> Result<(), ValidationError> {
    let archive = ZipArchive::new(Cursor::new(data)).map_err(|_| {
        let mut err = ValidationError::new("archive_not_zip");
        err.message = Some("The uploaded file is not a zip.".into());
        err
    })?;

    let names: Vec<&str> = archive.file_names().collect();
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|entry| {
            if entry.ends_with('/') {
                !names.iter().any(|name| name.starts_with(entry))
            } else {
                !names.contains(entry)
            }
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let mut err = ValidationError::new("archive_missing_entries");
    err.message = Some(
        format!(
            "The zip must have the following files: {}",
            required.join(", ")
        )
        .into(),
    );
    Err(err)
}

/// Checks that an uploaded picture declares an image mimetype.
pub fn validate_picture(mimetype: &str) -> Result<(), ValidationError> {
    if mimetype.starts_with("image/") {
        Ok(())
    } else {
        let mut err = ValidationError::new("picture_mimetype");
        err.message = Some("The uploaded file is not a picture.".into());
        Err(err)
    }
}

/// Split free-text tags on commas and whitespace, dropping duplicates but keeping order.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Human readable message carried by a [`ValidationError`].
pub fn describe(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|message| message.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::zip_with;

    #[test]
    fn test_validate_page_name_valid() {
        assert!(validate_page_name("pong").is_ok());
        assert!(validate_page_name("Space_Invaders2").is_ok());
    }

    #[test]
    fn test_validate_page_name_invalid() {
        assert!(validate_page_name("").is_err());
        assert!(validate_page_name("space invaders").is_err());
        assert!(validate_page_name("pong-2").is_err());
        assert!(validate_page_name("pöng").is_err());
    }

    #[test]
    fn archive_with_required_files_passes() {
        let data = zip_with(&["pong/pong.py", "pong/data/sprite.png"]);
        assert!(validate_archive(&data, &["pong/pong.py".into()]).is_ok());
        assert!(validate_archive(&data, &["pong/".into()]).is_ok());
    }

    #[test]
    fn archive_missing_files_lists_requirements() {
        let data = zip_with(&["pong/other.py"]);
        let err = validate_archive(&data, &["pong/__init__.py".into()]).unwrap_err();
        assert_eq!(
            describe(&err),
            "The zip must have the following files: pong/__init__.py"
        );
    }

    #[test]
    fn non_zip_is_rejected() {
        let err = validate_archive(b"not a zip", &[]).unwrap_err();
        assert_eq!(describe(&err), "The uploaded file is not a zip.");
    }

    #[test]
    fn pictures_need_image_mimetype() {
        assert!(validate_picture("image/png").is_ok());
        assert!(validate_picture("application/zip").is_err());
    }

    #[test]
    fn tags_are_split_and_deduplicated() {
        assert_eq!(
            parse_tags("arcade, retro  arcade,,2d"),
            vec!["arcade", "retro", "2d"]
        );
        assert!(parse_tags("  ").is_empty());
    }
}
