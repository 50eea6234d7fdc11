#![allow(dead_code)]

use hypernav::api::{Api, ApiBuilder, LinkRelation, Verb};
use hypernav::dispatcher::{DispatchRequest, RequestDispatcher};
use hypernav::link::RelationCatalog;
use hypernav::model::{DocumentModel, Model};
use hypernav::registry::ApiRegistry;
use hypernav::schema::{Prototype, RelationSlot, StaticSchemaService, ValueKind};
use hypernav::services::Services;
use std::sync::{Arc, Mutex};

pub const A: &str = "http://a.example";
pub const B: &str = "http://b.example";

/// Dispatcher that records every request and answers with an empty model of
/// the requested schema.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    requests: Mutex<Vec<DispatchRequest>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl RequestDispatcher for RecordingDispatcher {
    fn request(&self, request: DispatchRequest) -> anyhow::Result<Option<Arc<dyn Model>>> {
        let schema = request
            .dimensions
            .schema_uri()
            .unwrap_or("Document")
            .to_string();
        let href = request.href.clone();
        self.requests.lock().unwrap().push(request);
        if self.fail {
            anyhow::bail!("backend unavailable");
        }
        Ok(Some(Arc::new(DocumentModel::new(schema).with_uri(href))))
    }
}

pub fn schemas() -> StaticSchemaService {
    StaticSchemaService::new()
        .with_prototype(Prototype::new("Team").key_slot("teamId", ValueKind::Integer))
        .with_prototype(
            Prototype::new("Player")
                .key_slot("playerId", ValueKind::Text)
                .relation_slot(RelationSlot::new("team", "Team").bind("teamId", "teamRef")),
        )
        .with_prototype(Prototype::new("Color"))
}

pub fn relations() -> RelationCatalog {
    RelationCatalog::with_relations([
        LinkRelation::new("self", Verb::Get),
        LinkRelation::new("update", Verb::Save).with_request_schema("Team"),
        LinkRelation::new("remove", Verb::Delete),
        LinkRelation::new("team", Verb::Get),
        LinkRelation::new("roster", Verb::Get),
    ])
}

pub fn registry_with(dispatcher: Arc<RecordingDispatcher>) -> ApiRegistry {
    ApiRegistry::new(
        Services::new(Arc::new(schemas()), Arc::new(relations())).with_dispatcher(dispatcher),
    )
}

/// Docroot, `/teams`, `/teams/{teamId}` (Team) and its players.
pub fn teams_api(base: &str) -> Api {
    ApiBuilder::new(base)
        .title("Teams")
        .resource("/teams/{teamId}", Some("Team"))
        .resource("/teams/{teamId}/players/{playerId}", Some("Player"))
        .link("/teams/{teamId}", "self", "/teams/{teamId}")
        .link("/teams/{teamId}", "update", "/teams/{teamId}")
        .link("/teams/{teamId}", "remove", "/teams/{teamId}")
        .link("/teams/{teamId}/players/{playerId}", "self", "/teams/{teamId}/players/{playerId}")
        .link("/teams/{teamId}/players/{playerId}", "team", "/teams/{teamId}")
        .build()
        .unwrap()
}

pub fn team(id: u64) -> Arc<dyn Model> {
    Arc::new(
        DocumentModel::new("Team")
            .with_uri(format!("{A}/teams/{id}"))
            .with_slot("teamId", id),
    )
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temporary file with extension `ext`.
    pub fn create_temp_definition(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("hypernav_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_definition(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_definition(content, "json")
    }
}
