//! Request and response bodies of the `/gamedep` routes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{
        BinaryEntity, DependencyEntity, GameDepKind, PageEntity, RevisionEntity, VoteTally,
    },
    dto::{format_system_time, validation::validate_page_name},
};

/// Create-or-update form of a page.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditPageRequest {
    /// New name of the page; only `a-z A-Z 0-9 _`.
    #[validate(custom(function = "validate_page_name"))]
    pub name: String,
    /// Human readable title.
    #[validate(length(min = 1, max = 128))]
    pub display_name: String,
    /// Free-form description.
    #[serde(default)]
    #[validate(length(max = 16384))]
    pub description: String,
    /// Free text, split on commas and whitespace.
    #[serde(default)]
    pub tags: String,
}

/// Create-or-update form of a revision.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RevisionRequest {
    /// Version number, unique within the page.
    #[validate(range(min = 0.0))]
    pub version: f64,
    /// Name of a `moduletypes` lookup row.
    #[serde(alias = "moduletype")]
    pub module_type: String,
}

/// Dependency form. A missing revision or `"latest"` tracks the newest published revision.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DependencyRequest {
    /// Revision id to pin, or `latest`.
    #[serde(default)]
    pub revision: Option<String>,
}

/// Sorted page names of one kind.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageListResponse {
    /// Page names.
    pub pages: Vec<String>,
}

/// Reference to an uploaded file.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileRef {
    /// Stored file id.
    pub id: Uuid,
    /// Download URL.
    pub url: String,
}

/// Binary of a revision.
#[derive(Debug, Serialize, ToSchema)]
pub struct BinarySummary {
    /// Binary id.
    pub id: Uuid,
    /// Stored artifact.
    pub file: FileRef,
    /// Target operating system.
    pub operating_system: String,
    /// Target architecture.
    pub architecture: String,
}

/// Revision with its attachments.
#[derive(Debug, Serialize, ToSchema)]
pub struct RevisionSummary {
    /// Revision id.
    pub id: Uuid,
    /// Version label such as `1.0`.
    pub version: String,
    /// `file` or `folder`.
    pub module_type: String,
    /// Creation time, RFC 3339.
    pub created: String,
    /// Visible in the export.
    pub published: bool,
    /// Source archive; games only.
    pub source: Option<FileRef>,
    /// Platform builds.
    pub binaries: Vec<BinarySummary>,
}

/// A dependency edge resolved against the target page.
#[derive(Debug, Serialize, ToSchema)]
pub struct DependencySummary {
    /// Dependency link id.
    pub id: Uuid,
    /// Name of the target page.
    pub name: String,
    /// Title of the target page.
    pub display_name: String,
    /// `None` when the dependency follows the latest version.
    pub revision: Option<Uuid>,
    /// Label of the resolved revision, if any.
    pub version: Option<String>,
}

/// Metadata of an attached picture.
#[derive(Debug, Serialize, ToSchema)]
pub struct PictureSummary {
    /// Stored file id.
    pub id: Uuid,
    /// Uploaded filename.
    pub name: String,
    /// Content type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Download URL.
    pub url: String,
}

/// Like and dislike counts of a page.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteSummary {
    /// Number of likes.
    pub likes: u64,
    /// Number of dislikes.
    pub dislikes: u64,
}

impl From<VoteTally> for VoteSummary {
    fn from(tally: VoteTally) -> Self {
        Self {
            likes: tally.likes,
            dislikes: tally.dislikes,
        }
    }
}

/// Item view of a page, with the selected (or newest) revision.
#[derive(Debug, Serialize, ToSchema)]
pub struct PageDetail {
    /// Page id.
    pub id: Uuid,
    /// Route segment of the kind (`games` or `dependencies`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Page name.
    pub name: String,
    /// Human readable title.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Creator of the page.
    pub owner: String,
    /// Creation time, RFC 3339.
    pub created: String,
    /// Search tags.
    pub tags: Vec<String>,
    /// Attached pictures.
    pub pictures: Vec<FileRef>,
    /// Every revision, newest first.
    pub revisions: Vec<RevisionSummary>,
    /// Requested revision, else the newest one.
    pub revision: Option<RevisionSummary>,
    /// Live dependency targets.
    pub dependencies: Vec<DependencySummary>,
    /// Vote counts.
    pub votes: VoteSummary,
}

/// Body of `/api/gamedep/{type}/item/{page_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiPageResponse {
    /// Page id.
    pub id: Uuid,
    /// Route segment of the kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Page name.
    pub name: String,
    /// Human readable title.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Creator of the page.
    pub owner: String,
    /// Creation time, RFC 3339.
    pub created: String,
    /// Search tags.
    pub tags: Vec<String>,
    /// Revisions keyed by their version label.
    #[schema(value_type = Object)]
    pub versions: IndexMap<String, RevisionSummary>,
}

impl FileRef {
    /// Reference `id`, downloadable at `url`.
    pub fn new(id: Uuid, url: String) -> Self {
        Self { id, url }
    }
}

impl BinarySummary {
    /// Summarise a binary, building download links with `file_url`.
    pub fn from_entity(binary: &BinaryEntity, file_url: impl Fn(Uuid) -> String) -> Self {
        Self {
            id: binary.id,
            file: FileRef::new(binary.file_id, file_url(binary.file_id)),
            operating_system: binary.operating_system.clone(),
            architecture: binary.architecture.clone(),
        }
    }
}

impl RevisionSummary {
    /// Summarise a revision and its files.
    pub fn from_entity(revision: &RevisionEntity, file_url: impl Fn(Uuid) -> String) -> Self {
        Self {
            id: revision.id,
            version: revision.version_label(),
            module_type: revision.module_type.as_str().to_owned(),
            created: format_system_time(revision.created_at),
            published: revision.published,
            source: revision
                .source_file
                .map(|id| FileRef::new(id, file_url(id))),
            binaries: revision
                .binaries
                .iter()
                .map(|binary| BinarySummary::from_entity(binary, &file_url))
                .collect(),
        }
    }
}

impl DependencySummary {
    /// Resolve `dependency` against its target page.
    pub fn resolve(dependency: &DependencyEntity, target: &PageEntity) -> Self {
        let revision = dependency
            .revision_id
            .and_then(|id| target.revision(id))
            .or_else(|| target.latest_published());
        Self {
            id: dependency.id,
            name: target.name.clone(),
            display_name: target.display_name.clone(),
            revision: dependency.revision_id,
            version: revision.map(RevisionEntity::version_label),
        }
    }
}

pub(crate) fn kind_label(kind: GameDepKind) -> String {
    kind.route_segment().to_owned()
}
