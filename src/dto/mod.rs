use std::time::SystemTime;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Small payloads shared by several routes.
pub mod common;
pub mod gamedep;
/// Health check payloads.
pub mod health;
pub mod output;
pub mod upload;
pub mod validation;

/// RFC 3339 rendering of a stored timestamp.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
