//! Shape of the catalog export served by `/outputs/json` and `/outputs/xml`.
//!
//! Fields are declared in key order so the serialized tree is already sorted.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Root of the export.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogExport {
    /// `architectures` lookup table.
    pub architectures: Vec<ExportLookup>,
    /// One single-key object per page: `{"game": {..}}` or `{"dependency": {..}}`.
    #[schema(value_type = Vec<Object>)]
    pub gamedep: Vec<BTreeMap<&'static str, ExportPage>>,
    /// `operatingsystems` lookup table.
    pub operatingsystems: Vec<ExportLookup>,
}

/// Lookup row.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportLookup {
    /// Human readable label.
    pub display_name: String,
    /// Short identifier.
    pub name: String,
}

/// Exported page with its published revisions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportPage {
    /// Creation time.
    pub created: String,
    /// Dependencies with their resolved versions.
    pub dependencies: Vec<ExportDependency>,
    /// Free-form description.
    pub description: String,
    /// Human readable title.
    pub display_name: String,
    /// Page name.
    pub name: String,
    /// Published revisions, newest first.
    pub revisions: Vec<ExportRevision>,
    /// Search tags.
    pub tags: Vec<String>,
}

/// Dependency reference.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportDependency {
    /// Name of the dependency page.
    pub dependency: String,
    /// Pinned version, or the latest published one.
    pub version: String,
}

/// Published revision.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportRevision {
    /// Platform builds.
    pub binaries: Vec<ExportBinary>,
    /// Creation time.
    pub created: String,
    /// `file` or `folder`.
    pub moduletype: String,
    /// Download URL of the source archive; games only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Version label.
    pub version: String,
}

/// Build artifact of a revision.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportBinary {
    /// Target architecture.
    pub architecture: String,
    /// Download URL of the build artifact.
    pub binary: String,
    /// Target operating system.
    pub operating_system: String,
}
