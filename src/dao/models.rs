use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Which half of the catalog a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameDepKind {
    /// Playable game.
    #[serde(rename = "game")]
    Game,
    /// Library other pages build on.
    #[serde(rename = "dep")]
    Dependency,
}

impl GameDepKind {
    /// Parse the `{type}` segment used in catalog routes (`games` / `dependencies`).
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "games" => Some(Self::Game),
            "dependencies" => Some(Self::Dependency),
            _ => None,
        }
    }

    /// Route segment for this kind.
    pub fn route_segment(self) -> &'static str {
        match self {
            Self::Game => "games",
            Self::Dependency => "dependencies",
        }
    }

    /// Value persisted in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Dependency => "dep",
        }
    }

    /// Key wrapping each entry of the exported catalog.
    pub fn export_key(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Dependency => "dependency",
        }
    }
}

/// How the packaged Python module is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// Single `name.py` module.
    File,
    /// Package folder with an `__init__.py`.
    Folder,
}

impl ModuleType {
    /// Parse a `moduletypes` lookup name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }

    /// Lookup name of this module type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    /// Archive entries a source upload for `page_name` must contain.
    pub fn required_entries(self, page_name: &str) -> Vec<String> {
        match self {
            Self::File => vec![format!("{page_name}/{page_name}.py")],
            Self::Folder => vec![format!("{page_name}/__init__.py")],
        }
    }
}

/// A game or dependency catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Game or dependency.
    pub kind: GameDepKind,
    /// Unique (per kind, among live pages) identifier used in URLs.
    pub name: String,
    /// Human readable title.
    pub display_name: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Identity of the user that created the page.
    pub owner: String,
    /// Creation time.
    pub created_at: SystemTime,
    /// Soft-delete flag; deleted pages are invisible to every lookup.
    pub deleted: bool,
    /// Search tags.
    pub tags: Vec<String>,
    /// File ids of attached pictures.
    pub pictures: Vec<Uuid>,
    /// Newest first.
    pub revisions: Vec<RevisionEntity>,
    /// Pages this page depends on.
    pub dependencies: Vec<DependencyEntity>,
    /// Write counter bumped by every save; saves carrying an older value are rejected.
    #[serde(default)]
    pub generation: u64,
}

impl PageEntity {
    /// Fresh live page with no revisions.
    pub fn new(kind: GameDepKind, name: String, display_name: String, owner: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            display_name,
            description: String::new(),
            owner,
            created_at: SystemTime::now(),
            deleted: false,
            tags: Vec::new(),
            pictures: Vec::new(),
            revisions: Vec::new(),
            dependencies: Vec::new(),
            generation: 0,
        }
    }

    /// Revision with the given id.
    pub fn revision(&self, id: Uuid) -> Option<&RevisionEntity> {
        self.revisions.iter().find(|rev| rev.id == id)
    }

    /// Mutable revision with the given id.
    pub fn revision_mut(&mut self, id: Uuid) -> Option<&mut RevisionEntity> {
        self.revisions.iter_mut().find(|rev| rev.id == id)
    }

    /// Newest revision that has been published.
    pub fn latest_published(&self) -> Option<&RevisionEntity> {
        self.revisions.iter().find(|rev| rev.published)
    }

    /// Published revisions, newest first.
    pub fn published_revisions(&self) -> impl Iterator<Item = &RevisionEntity> {
        self.revisions.iter().filter(|rev| rev.published)
    }

    /// Insert a revision keeping the newest-first ordering.
    pub fn push_revision(&mut self, revision: RevisionEntity) {
        self.revisions.insert(0, revision);
    }

    /// Dependency entry pointing at `page_id`.
    pub fn dependency_on(&self, page_id: Uuid) -> Option<&DependencyEntity> {
        self.dependencies.iter().find(|dep| dep.page_id == page_id)
    }
}

/// A versioned release of a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevisionEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Version number, unique within the page.
    pub version: f64,
    /// How the packaged module is initialised.
    pub module_type: ModuleType,
    /// Creation time.
    pub created_at: SystemTime,
    /// Only published revisions are visible to unauthenticated readers.
    pub published: bool,
    /// Source archive (games only).
    pub source_file: Option<Uuid>,
    /// Platform builds.
    pub binaries: Vec<BinaryEntity>,
}

impl RevisionEntity {
    /// Unpublished revision without files.
    pub fn new(version: f64, module_type: ModuleType) -> Self {
        Self {
            id: Uuid::new_v4(),
            version,
            module_type,
            created_at: SystemTime::now(),
            published: false,
            source_file: None,
            binaries: Vec::new(),
        }
    }

    /// Binary with the given id.
    pub fn binary(&self, id: Uuid) -> Option<&BinaryEntity> {
        self.binaries.iter().find(|bin| bin.id == id)
    }

    /// Mutable binary with the given id.
    pub fn binary_mut(&mut self, id: Uuid) -> Option<&mut BinaryEntity> {
        self.binaries.iter_mut().find(|bin| bin.id == id)
    }

    /// Every stored file owned by this revision.
    pub fn file_ids(&self) -> Vec<Uuid> {
        self.source_file
            .into_iter()
            .chain(self.binaries.iter().map(|bin| bin.file_id))
            .collect()
    }

    /// Version rendered the way clients expect it (`1.0`, `0.25`).
    pub fn version_label(&self) -> String {
        format_version(self.version)
    }
}

/// Render a version number, always keeping at least one decimal.
pub fn format_version(version: f64) -> String {
    if version.fract() == 0.0 {
        format!("{version:.1}")
    } else {
        version.to_string()
    }
}

/// One platform/architecture build artifact attached to a revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Stored build artifact.
    pub file_id: Uuid,
    /// Name of an [`LookupTable::OperatingSystems`] row.
    pub operating_system: String,
    /// Name of an [`LookupTable::Architectures`] row.
    pub architecture: String,
}

/// Link from a page to a dependency page, optionally pinned to one revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Page depended upon.
    pub page_id: Uuid,
    /// `None` means "use the latest version".
    pub revision_id: Option<Uuid>,
}

/// A user's like/dislike on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Page voted on.
    pub page_id: Uuid,
    /// Voter identity.
    pub user: String,
    /// `true` for a like, `false` for a dislike.
    pub like: bool,
    /// Time of the latest change.
    pub created_at: SystemTime,
}

/// Aggregated votes of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    /// Number of likes.
    pub likes: u64,
    /// Number of dislikes.
    pub dislikes: u64,
}

/// An uploaded file (source archive, binary or picture).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Original filename supplied by the uploader.
    pub name: String,
    /// Content type supplied by the uploader.
    pub mimetype: String,
    /// Length of `data` in bytes.
    pub size: u64,
    /// File contents.
    pub data: Vec<u8>,
    /// Number of completed downloads.
    pub download_count: u64,
    /// Upload time.
    pub created_at: SystemTime,
}

impl FileEntity {
    /// Wrap uploaded bytes in a new file with a fresh id.
    pub fn new(name: String, mimetype: String, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            mimetype,
            size: data.len() as u64,
            data,
            download_count: 0,
            created_at: SystemTime::now(),
        }
    }
}

/// Static lookup tables seeded when a store is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupTable {
    /// Operating systems binaries can target.
    OperatingSystems,
    /// CPU architectures binaries can target.
    Architectures,
    /// Module initialisation styles.
    ModuleTypes,
}

impl LookupTable {
    /// Every table, in seeding order.
    pub const ALL: [LookupTable; 3] = [
        LookupTable::OperatingSystems,
        LookupTable::Architectures,
        LookupTable::ModuleTypes,
    ];

    /// Parse the `{table}` route segment.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "operatingsystems" => Some(Self::OperatingSystems),
            "architectures" => Some(Self::Architectures),
            "moduletypes" => Some(Self::ModuleTypes),
            _ => None,
        }
    }

    /// Route segment and storage name of the table.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OperatingSystems => "operatingsystems",
            Self::Architectures => "architectures",
            Self::ModuleTypes => "moduletypes",
        }
    }

    /// Rows inserted into a fresh store, in display order.
    pub fn seed(self) -> Vec<LookupEntity> {
        let rows: &[(&str, &str)] = match self {
            Self::OperatingSystems => &[
                ("pi", "Platform Independent"),
                ("win", "Windows"),
                ("mac", "Mac OS X"),
                ("lin", "Linux"),
                ("sol", "Solaris"),
                ("fbsd", "FreeBSD"),
                ("nbsd", "NetBSD"),
                ("obsd", "OpenBSD"),
            ],
            Self::Architectures => &[
                ("pi", "Platform Independent"),
                ("i386", "32bit X86"),
                ("x86_64", "64bit X86"),
                ("arm", "ARM Little Endian"),
                ("armeb", "ARM Big Endian"),
                ("ppc", "32bit PowerPC"),
                ("ppc64", "64bit PowerPC"),
                ("sparc", "32bit SPARC"),
                ("sparc64", "64bit SPARC"),
            ],
            Self::ModuleTypes => &[
                (
                    "file",
                    "Python module that is initialised with (for example) foo.py",
                ),
                (
                    "folder",
                    "Python module that is initialised with __init__.py",
                ),
            ],
        };

        rows.iter()
            .enumerate()
            .map(|(position, (name, display_name))| LookupEntity {
                table: self,
                position: position as u32,
                name: (*name).to_owned(),
                display_name: (*display_name).to_owned(),
            })
            .collect()
    }
}

/// One row of a lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupEntity {
    /// Owning table.
    pub table: LookupTable,
    /// Display order inside the table.
    pub position: u32,
    /// Short identifier referenced by pages.
    pub name: String,
    /// Human readable label.
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_segments_round_trip() {
        assert_eq!(GameDepKind::from_route("games"), Some(GameDepKind::Game));
        assert_eq!(
            GameDepKind::from_route("dependencies"),
            Some(GameDepKind::Dependency)
        );
        assert_eq!(GameDepKind::from_route("game"), None);
        assert_eq!(GameDepKind::Dependency.route_segment(), "dependencies");
    }

    #[test]
    fn version_label_keeps_one_decimal() {
        assert_eq!(format_version(1.0), "1.0");
        assert_eq!(format_version(0.1), "0.1");
        assert_eq!(format_version(2.25), "2.25");
    }

    #[test]
    fn required_entries_follow_module_type() {
        assert_eq!(ModuleType::File.required_entries("pong"), vec!["pong/pong.py"]);
        assert_eq!(
            ModuleType::Folder.required_entries("pong"),
            vec!["pong/__init__.py"]
        );
    }

    #[test]
    fn revisions_stay_newest_first() {
        let mut page = PageEntity::new(
            GameDepKind::Game,
            "pong".into(),
            "Pong".into(),
            "admin".into(),
        );
        let first = RevisionEntity::new(0.1, ModuleType::File);
        let second = RevisionEntity::new(0.2, ModuleType::File);
        let second_id = second.id;
        page.push_revision(first);
        page.push_revision(second);

        assert_eq!(page.revisions[0].id, second_id);
        assert!(page.latest_published().is_none());
    }

    #[test]
    fn seeds_are_ordered() {
        let os = LookupTable::OperatingSystems.seed();
        assert_eq!(os.len(), 8);
        assert_eq!(os[0].name, "pi");
        assert_eq!(os[3].display_name, "Linux");
        assert_eq!(LookupTable::Architectures.seed().len(), 9);
        assert_eq!(LookupTable::ModuleTypes.seed()[1].name, "folder");
    }
}
