//! Read-only projections of the whole catalog and raw file downloads.

use std::{collections::BTreeMap, fmt::Display};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use serde::Serialize;
use serde_json::{Value, ser::PrettyFormatter};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        catalog_store::CatalogStore,
        models::{FileEntity, GameDepKind, LookupTable, PageEntity},
    },
    dto::{
        format_system_time,
        output::{
            CatalogExport, ExportBinary, ExportDependency, ExportLookup, ExportPage,
            ExportRevision,
        },
    },
    error::ServiceError,
    state::SharedState,
};

const XML_ROOT: &str = "hypernucleus";
const XML_LIST_ITEM: &str = "item";

/// Outcome of a conditional file download.
#[derive(Debug)]
pub enum FileDownload {
    /// The client copy is current.
    NotModified {
        /// Tag the client already holds.
        etag: String,
    },
    /// Full file to send.
    Content {
        /// Tag of the stored file.
        etag: String,
        /// Stored file.
        file: FileEntity,
    },
}

/// Walk every live page with at least one revision into the export tree.
pub async fn build_export(state: &SharedState) -> Result<CatalogExport, ServiceError> {
    let store = state.require_catalog_store().await?;
    let config = state.config();

    let lookup = |rows: Vec<crate::dao::models::LookupEntity>| {
        rows.into_iter()
            .map(|row| ExportLookup {
                display_name: row.display_name,
                name: row.name,
            })
            .collect::<Vec<_>>()
    };
    let operatingsystems = lookup(store.list_lookups(LookupTable::OperatingSystems).await?);
    let architectures = lookup(store.list_lookups(LookupTable::Architectures).await?);

    let mut gamedep = Vec::new();
    for kind in [GameDepKind::Game, GameDepKind::Dependency] {
        for page in store.list_pages(kind).await? {
            if page.revisions.is_empty() {
                continue;
            }

            let dependencies = export_dependencies(store.as_ref(), &page).await?;
            let revisions = page
                .published_revisions()
                .map(|rev| ExportRevision {
                    binaries: rev
                        .binaries
                        .iter()
                        .map(|binary| ExportBinary {
                            architecture: binary.architecture.clone(),
                            binary: config.file_url(binary.file_id),
                            operating_system: binary.operating_system.clone(),
                        })
                        .collect(),
                    created: format_system_time(rev.created_at),
                    moduletype: rev.module_type.as_str().to_owned(),
                    source: match kind {
                        GameDepKind::Game => rev.source_file.map(|id| config.file_url(id)),
                        GameDepKind::Dependency => None,
                    },
                    version: rev.version_label(),
                })
                .collect();

            let entry = ExportPage {
                created: format_system_time(page.created_at),
                dependencies,
                description: page.description.clone(),
                display_name: page.display_name.clone(),
                name: page.name.clone(),
                revisions,
                tags: page.tags.clone(),
            };
            gamedep.push(BTreeMap::from([(kind.export_key(), entry)]));
        }
    }

    debug!(entries = gamedep.len(), "catalog export built");
    Ok(CatalogExport {
        architectures,
        gamedep,
        operatingsystems,
    })
}

/// Export rendered as JSON with sorted keys and four-space indentation.
pub async fn show_json(state: &SharedState) -> Result<String, ServiceError> {
    let export = build_export(state).await?;
    render_json(&export)
}

/// Export rendered as XML under a `<hypernucleus>` root.
pub async fn show_xml(state: &SharedState) -> Result<String, ServiceError> {
    let export = build_export(state).await?;
    let value = serde_json::to_value(&export).map_err(internal)?;
    render_xml(&value)
}

/// Serve file `id` unless the client already holds the current copy.
///
/// Only full downloads count towards the download counter.
pub async fn show_file(
    state: &SharedState,
    id: Uuid,
    if_none_match: Option<&str>,
) -> Result<FileDownload, ServiceError> {
    let store = state.require_catalog_store().await?;
    let file = store
        .find_file(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("file `{id}` not found")))?;

    let etag = file_etag(id);
    if if_none_match.is_some_and(|header| etag_matches(header, &etag)) {
        return Ok(FileDownload::NotModified { etag });
    }

    store.record_download(id).await?;
    debug!(file = %id, name = %file.name, "file served");
    Ok(FileDownload::Content { etag, file })
}

/// Strong validator of a stored file: SHA-256 of its id.
pub fn file_etag(id: Uuid) -> String {
    format!("{:x}", Sha256::digest(id.to_string().as_bytes()))
}

fn etag_matches(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.trim_start_matches("W/").trim_matches('"') == etag
    })
}

async fn export_dependencies(
    store: &dyn CatalogStore,
    page: &PageEntity,
) -> Result<Vec<ExportDependency>, ServiceError> {
    let mut exported = Vec::with_capacity(page.dependencies.len());
    for dependency in &page.dependencies {
        let Some(target) = store.find_page_by_id(dependency.page_id).await? else {
            continue;
        };
        if target.deleted {
            continue;
        }
        let revision = dependency
            .revision_id
            .and_then(|id| target.revision(id))
            .or_else(|| target.latest_published());
        if let Some(revision) = revision {
            exported.push(ExportDependency {
                dependency: target.name.clone(),
                version: revision.version_label(),
            });
        }
    }
    Ok(exported)
}

fn render_json<T: Serialize>(value: &T) -> Result<String, ServiceError> {
    // Round-trip through `Value` so map keys come out sorted.
    let value = serde_json::to_value(value).map_err(internal)?;
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer).map_err(internal)?;
    String::from_utf8(buffer).map_err(internal)
}

fn render_xml(value: &Value) -> Result<String, ServiceError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(internal)?;
    write_element(&mut writer, XML_ROOT, value)?;
    String::from_utf8(writer.into_inner()).map_err(internal)
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), ServiceError> {
    let text = match value {
        Value::Null => None,
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => None,
    };

    let is_empty = match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(internal);
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(internal)?;
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, XML_LIST_ITEM, item)?;
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
        }
        _ => {
            if let Some(text) = text {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(internal)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(internal)
}

fn internal(err: impl Display) -> ServiceError {
    ServiceError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        attachment_service, catalog_service, dependency_service,
        test_support::{page_request, revision_request, state, upload, zip_with},
    };

    async fn seed_catalog(state: &SharedState) {
        let mut request = page_request("pygame");
        request.tags = "library".into();
        catalog_service::create(state, GameDepKind::Dependency, request, "admin")
            .await
            .unwrap();
        let dep_rev = catalog_service::create_revision(
            state,
            GameDepKind::Dependency,
            "pygame",
            revision_request(1.0),
        )
        .await
        .unwrap();
        attachment_service::create_binary(
            state,
            GameDepKind::Dependency,
            "pygame",
            dep_rev.id,
            "lin",
            "x86_64",
            upload("pygame.zip", "application/zip", zip_with(&["pygame/__init__.py"])),
        )
        .await
        .unwrap();
        catalog_service::flip_published(state, GameDepKind::Dependency, "pygame", dep_rev.id)
            .await
            .unwrap();

        let dep_page = catalog_service::show(state, GameDepKind::Dependency, "pygame", None, true)
            .await
            .unwrap()
            .0;

        catalog_service::create(state, GameDepKind::Game, page_request("pong"), "admin")
            .await
            .unwrap();
        let game_rev =
            catalog_service::create_revision(state, GameDepKind::Game, "pong", revision_request(0.5))
                .await
                .unwrap();
        attachment_service::create_source(
            state,
            GameDepKind::Game,
            "pong",
            game_rev.id,
            upload("pong.zip", "application/zip", zip_with(&["pong/pong.py"])),
        )
        .await
        .unwrap();
        catalog_service::flip_published(state, GameDepKind::Game, "pong", game_rev.id)
            .await
            .unwrap();
        catalog_service::create_revision(state, GameDepKind::Game, "pong", revision_request(0.6))
            .await
            .unwrap();
        dependency_service::create_dependency(state, GameDepKind::Game, "pong", dep_page.id, None)
            .await
            .unwrap();

        catalog_service::create(state, GameDepKind::Game, page_request("empty"), "admin")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn export_skips_pages_without_revisions_and_unpublished_revisions() {
        let state = state();
        seed_catalog(&state).await;

        let export = build_export(&state).await.unwrap();
        assert_eq!(export.operatingsystems.len(), 8);
        assert_eq!(export.architectures.len(), 9);
        assert_eq!(export.gamedep.len(), 2);

        let game = &export.gamedep[0]["game"];
        assert_eq!(game.name, "pong");
        assert_eq!(game.revisions.len(), 1);
        assert_eq!(game.revisions[0].version, "0.5");
        assert!(game.revisions[0].source.is_some());
        assert_eq!(game.dependencies[0].dependency, "pygame");
        assert_eq!(game.dependencies[0].version, "1.0");

        let dependency = &export.gamedep[1]["dependency"];
        assert_eq!(dependency.tags, vec!["library"]);
        assert!(dependency.revisions[0].source.is_none());
        assert_eq!(dependency.revisions[0].binaries[0].operating_system, "lin");
    }

    #[tokio::test]
    async fn json_is_sorted_and_indented() {
        let state = state();
        seed_catalog(&state).await;

        let json = show_json(&state).await.unwrap();
        assert!(json.starts_with("{\n    \"architectures\": ["));
        let arch = json.find("\"architectures\"").unwrap();
        let gamedep = json.find("\"gamedep\"").unwrap();
        let os = json.find("\"operatingsystems\"").unwrap();
        assert!(arch < gamedep && gamedep < os);

        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["gamedep"][0]["game"]["revisions"][0]["moduletype"], "file");
    }

    #[tokio::test]
    async fn xml_uses_item_elements() {
        let state = state();
        seed_catalog(&state).await;

        let xml = show_xml(&state).await.unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<hypernucleus>"));
        assert!(xml.contains("<name>pong</name>"));
        assert!(xml.contains("<item>"));
        assert!(xml.trim_end().ends_with("</hypernucleus>"));
    }

    #[tokio::test]
    async fn file_download_honours_etag() {
        let state = state();
        let store = state.require_catalog_store().await.unwrap();
        let file = FileEntity::new("a.txt".into(), "text/plain".into(), b"hello".to_vec());
        let id = file.id;
        store.insert_file(file).await.unwrap();

        let etag = match show_file(&state, id, None).await.unwrap() {
            FileDownload::Content { etag, file } => {
                assert_eq!(file.data, b"hello");
                etag
            }
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(etag, file_etag(id));

        let quoted = format!("\"{etag}\"");
        assert!(matches!(
            show_file(&state, id, Some(&quoted)).await.unwrap(),
            FileDownload::NotModified { .. }
        ));
        assert_eq!(
            store.find_file(id).await.unwrap().unwrap().download_count,
            1
        );

        let err = show_file(&state, Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn etag_matching_accepts_lists_and_weak_tags() {
        assert!(etag_matches("\"abc\"", "abc"));
        assert!(etag_matches("W/\"abc\", \"def\"", "def"));
        assert!(etag_matches("*", "abc"));
        assert!(!etag_matches("\"abd\"", "abc"));
    }
}
