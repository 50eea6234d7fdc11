use super::types::{join_path, Api, LinkRelation, LinkTemplate, ResourceTemplate};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk form of an API definition.
///
/// ```yaml
/// uri: http://a.example
/// title: Teams
/// auto_link: false
/// relations:
///   - { uri: self, verb: Get }
///   - { uri: update, verb: Save, request_schema: Team }
/// root:
///   children:
///     - path: teams
///       children:
///         - path: "{teamId}"
///           schema: Team
/// links:
///   - { from: "/teams/{teamId}", rel: self, to: "/teams/{teamId}" }
/// ```
///
/// Resource ids default to the resource's full path, so links can name
/// resources by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDocument {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub auto_link: bool,
    #[serde(default)]
    pub relations: Vec<LinkRelation>,
    #[serde(default)]
    pub root: ResourceDocument,
    #[serde(default)]
    pub links: Vec<LinkDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Path segment; empty for the docroot.
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub children: Vec<ResourceDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    pub from: String,
    pub rel: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
}

/// An [`Api`] together with what its document asked the registry to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDefinition {
    pub api: Api,
    /// Relations shadowing the shared loader while the API is built, registered
    /// with it once the API is published.
    pub relations: Vec<LinkRelation>,
    pub auto_link: bool,
}

impl From<ApiDocument> for ApiDefinition {
    fn from(doc: ApiDocument) -> Self {
        let root = resource_template(doc.root, "/");
        let mut api = Api::new(doc.uri, root).with_title(doc.title);
        api.link_templates = doc
            .links
            .into_iter()
            .map(|l| LinkTemplate {
                relation: l.rel,
                referrer_id: l.from.into(),
                endpoint_id: l.to.into(),
                request_schema: l.request_schema,
                response_schema: l.response_schema,
            })
            .collect();
        ApiDefinition {
            api,
            relations: doc.relations,
            auto_link: doc.auto_link,
        }
    }
}

fn resource_template(doc: ResourceDocument, full_path: &str) -> ResourceTemplate {
    let mut template = ResourceTemplate::new(
        doc.id.unwrap_or_else(|| full_path.to_string()),
        doc.path,
    );
    template.default_schema = doc.schema;
    template.children = doc
        .children
        .into_iter()
        .map(|child| {
            let child_path = join_path(full_path, &child.path);
            resource_template(child, &child_path)
        })
        .collect();
    template
}

/// Format of an API definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Yaml,
    Json,
}

impl DefinitionFormat {
    /// `.yaml`/`.yml` is YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => DefinitionFormat::Yaml,
            _ => DefinitionFormat::Json,
        }
    }
}

/// Parse an API definition from text.
pub fn parse_api_definition(content: &str, format: DefinitionFormat) -> anyhow::Result<ApiDefinition> {
    let doc: ApiDocument = match format {
        DefinitionFormat::Yaml => serde_yaml::from_str(content)?,
        DefinitionFormat::Json => serde_json::from_str(content)?,
    };
    Ok(doc.into())
}

/// Read and parse an API definition file; the format follows the extension.
pub fn load_api_definition(path: impl AsRef<Path>) -> anyhow::Result<ApiDefinition> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read API definition {}", path.display()))?;
    parse_api_definition(&content, DefinitionFormat::from_path(path))
        .with_context(|| format!("Failed to parse API definition {}", path.display()))
}
