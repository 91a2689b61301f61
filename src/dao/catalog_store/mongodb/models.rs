use mongodb::bson::{Binary, DateTime, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    BinaryEntity, DependencyEntity, FileEntity, GameDepKind, LookupEntity, LookupTable,
    ModuleType, PageEntity, RevisionEntity, VoteEntity,
};

/// Pages with their embedded revisions.
pub const PAGE_COLLECTION_NAME: &str = "pages";
/// One document per user vote.
pub const VOTE_COLLECTION_NAME: &str = "votes";
/// Uploaded files.
pub const FILE_COLLECTION_NAME: &str = "files";
/// Seeded lookup rows.
pub const LOOKUP_COLLECTION_NAME: &str = "lookups";

fn parse_id(collection: &'static str, value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|err| MongoDaoError::Malformed {
        collection,
        reason: format!("invalid id `{value}`: {err}"),
    })
}

/// Parse an id embedded in a page document.
fn pid(raw: &str) -> MongoResult<Uuid> {
    parse_id(PAGE_COLLECTION_NAME, raw)
}

/// Page document embedding its revisions, binaries and dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPageDocument {
    #[serde(rename = "_id")]
    id: String,
    kind: GameDepKind,
    name: String,
    display_name: String,
    description: String,
    owner: String,
    created_at: DateTime,
    deleted: bool,
    tags: Vec<String>,
    pictures: Vec<String>,
    revisions: Vec<MongoRevisionDocument>,
    dependencies: Vec<MongoDependencyDocument>,
    #[serde(default)]
    generation: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoRevisionDocument {
    id: String,
    version: f64,
    module_type: ModuleType,
    created_at: DateTime,
    published: bool,
    source_file: Option<String>,
    binaries: Vec<MongoBinaryDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoBinaryDocument {
    id: String,
    file_id: String,
    operating_system: String,
    architecture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoDependencyDocument {
    id: String,
    page_id: String,
    revision_id: Option<String>,
}

impl From<PageEntity> for MongoPageDocument {
    fn from(value: PageEntity) -> Self {
        Self {
            id: value.id.to_string(),
            kind: value.kind,
            name: value.name,
            display_name: value.display_name,
            description: value.description,
            owner: value.owner,
            created_at: DateTime::from_system_time(value.created_at),
            deleted: value.deleted,
            tags: value.tags,
            pictures: value.pictures.iter().map(Uuid::to_string).collect(),
            revisions: value.revisions.into_iter().map(Into::into).collect(),
            dependencies: value
                .dependencies
                .into_iter()
                .map(|dep| MongoDependencyDocument {
                    id: dep.id.to_string(),
                    page_id: dep.page_id.to_string(),
                    revision_id: dep.revision_id.map(|id| id.to_string()),
                })
                .collect(),
            generation: i64::try_from(value.generation).unwrap_or(i64::MAX),
        }
    }
}

impl From<RevisionEntity> for MongoRevisionDocument {
    fn from(value: RevisionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            version: value.version,
            module_type: value.module_type,
            created_at: DateTime::from_system_time(value.created_at),
            published: value.published,
            source_file: value.source_file.map(|id| id.to_string()),
            binaries: value
                .binaries
                .into_iter()
                .map(|bin| MongoBinaryDocument {
                    id: bin.id.to_string(),
                    file_id: bin.file_id.to_string(),
                    operating_system: bin.operating_system,
                    architecture: bin.architecture,
                })
                .collect(),
        }
    }
}

impl TryFrom<MongoPageDocument> for PageEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPageDocument) -> Result<Self, Self::Error> {
        let pictures = value
            .pictures
            .iter()
            .map(|raw| pid(raw))
            .collect::<MongoResult<Vec<_>>>()?;

        let revisions = value
            .revisions
            .into_iter()
            .map(RevisionEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;

        let dependencies = value
            .dependencies
            .into_iter()
            .map(|dep| {
                Ok(DependencyEntity {
                    id: pid(&dep.id)?,
                    page_id: pid(&dep.page_id)?,
                    revision_id: dep.revision_id.as_deref().map(pid).transpose()?,
                })
            })
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(Self {
            id: pid(&value.id)?,
            kind: value.kind,
            name: value.name,
            display_name: value.display_name,
            description: value.description,
            owner: value.owner,
            created_at: value.created_at.to_system_time(),
            deleted: value.deleted,
            tags: value.tags,
            pictures,
            revisions,
            dependencies,
            generation: u64::try_from(value.generation).unwrap_or_default(),
        })
    }
}

impl TryFrom<MongoRevisionDocument> for RevisionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRevisionDocument) -> Result<Self, Self::Error> {
        let binaries = value
            .binaries
            .into_iter()
            .map(|bin| {
                Ok(BinaryEntity {
                    id: pid(&bin.id)?,
                    file_id: pid(&bin.file_id)?,
                    operating_system: bin.operating_system,
                    architecture: bin.architecture,
                })
            })
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(Self {
            id: pid(&value.id)?,
            version: value.version,
            module_type: value.module_type,
            created_at: value.created_at.to_system_time(),
            published: value.published,
            source_file: value.source_file.as_deref().map(pid).transpose()?,
            binaries,
        })
    }
}

/// Vote document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVoteDocument {
    #[serde(rename = "_id")]
    id: String,
    page_id: String,
    user: String,
    like: bool,
    created_at: DateTime,
}

impl From<VoteEntity> for MongoVoteDocument {
    fn from(value: VoteEntity) -> Self {
        Self {
            id: value.id.to_string(),
            page_id: value.page_id.to_string(),
            user: value.user,
            like: value.like,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

/// File document, contents stored inline as BSON binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFileDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    mimetype: String,
    size: i64,
    data: Binary,
    download_count: i64,
    created_at: DateTime,
}

impl From<FileEntity> for MongoFileDocument {
    fn from(value: FileEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            mimetype: value.mimetype,
            size: value.size as i64,
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes: value.data,
            },
            download_count: value.download_count as i64,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoFileDocument> for FileEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoFileDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(FILE_COLLECTION_NAME, &value.id)?,
            name: value.name,
            mimetype: value.mimetype,
            size: value.size.max(0) as u64,
            data: value.data.bytes,
            download_count: value.download_count.max(0) as u64,
            created_at: value.created_at.to_system_time(),
        })
    }
}

/// Lookup row document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLookupDocument {
    table: String,
    position: i64,
    name: String,
    display_name: String,
}

impl From<LookupEntity> for MongoLookupDocument {
    fn from(value: LookupEntity) -> Self {
        Self {
            table: value.table.as_str().to_owned(),
            position: i64::from(value.position),
            name: value.name,
            display_name: value.display_name,
        }
    }
}

impl TryFrom<MongoLookupDocument> for LookupEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoLookupDocument) -> Result<Self, Self::Error> {
        let table = LookupTable::parse(&value.table).ok_or_else(|| MongoDaoError::Malformed {
            collection: LOOKUP_COLLECTION_NAME,
            reason: format!("unknown lookup table `{}`", value.table),
        })?;

        Ok(Self {
            table,
            position: value.position.clamp(0, i64::from(u32::MAX)) as u32,
            name: value.name,
            display_name: value.display_name,
        })
    }
}
