use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::LookupEntity;

/// Generic action acknowledgement carrying the user-facing message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Message shown to the user.
    pub message: String,
}

impl ActionResponse {
    /// Wrap a user-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of a select list offered to clients.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ChoiceItem {
    /// Value posted back by the client.
    pub value: String,
    /// Label displayed in the list.
    pub label: String,
}

impl ChoiceItem {
    /// Build a choice from a value and its label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Lookup row as exposed over HTTP.
#[derive(Debug, Serialize, ToSchema)]
pub struct LookupItem {
    /// Short identifier.
    pub name: String,
    /// Human readable label.
    pub display_name: String,
}

impl From<LookupEntity> for LookupItem {
    fn from(row: LookupEntity) -> Self {
        Self {
            name: row.name,
            display_name: row.display_name,
        }
    }
}
