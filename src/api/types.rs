use http::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a resource template within one API.
///
/// Ids are shared between the declarative tree, link templates and the
/// navigator's resource arena, so cloning is an `Arc` bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The closed set of REST verbs a link relation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verb {
    Get,
    Save,
    Delete,
    Invoke,
    Options,
    Metadata,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Save,
        Verb::Delete,
        Verb::Invoke,
        Verb::Options,
        Verb::Metadata,
    ];

    /// HTTP method a REST front end uses for this verb.
    #[must_use]
    pub fn http_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Save => Method::PUT,
            Verb::Delete => Method::DELETE,
            Verb::Invoke => Method::POST,
            Verb::Options => Method::OPTIONS,
            Verb::Metadata => Method::HEAD,
        }
    }

    /// Reverse of [`Verb::http_method`]; PATCH is treated as a save.
    #[must_use]
    pub fn from_http_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::PUT | Method::PATCH => Some(Verb::Save),
            Method::DELETE => Some(Verb::Delete),
            Method::POST => Some(Verb::Invoke),
            Method::OPTIONS => Some(Verb::Options),
            Method::HEAD => Some(Verb::Metadata),
            _ => None,
        }
    }

    /// Safe verbs never change server state.
    #[must_use]
    pub fn is_safe(self) -> bool {
        matches!(self, Verb::Get | Verb::Options | Verb::Metadata)
    }

    #[must_use]
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Verb::Invoke)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verb::Get => "Get",
            Verb::Save => "Save",
            Verb::Delete => "Delete",
            Verb::Invoke => "Invoke",
            Verb::Options => "Options",
            Verb::Metadata => "Metadata",
        };
        f.write_str(s)
    }
}

/// A named verb definition with optional generic schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRelation {
    /// Relation identifier, e.g. `self` or `http://relations.example/owner`.
    pub uri: String,
    pub verb: Verb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
}

impl LinkRelation {
    pub fn new(uri: impl Into<String>, verb: Verb) -> Self {
        Self {
            uri: uri.into(),
            verb,
            request_schema: None,
            response_schema: None,
        }
    }

    #[must_use]
    pub fn with_request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_response_schema(mut self, schema: impl Into<String>) -> Self {
        self.response_schema = Some(schema.into());
        self
    }
}

/// Directed, relation-labeled edge from a referrer resource to an endpoint resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTemplate {
    pub relation: String,
    pub referrer_id: ResourceId,
    pub endpoint_id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
}

impl LinkTemplate {
    pub fn new(
        referrer_id: impl Into<ResourceId>,
        relation: impl Into<String>,
        endpoint_id: impl Into<ResourceId>,
    ) -> Self {
        Self {
            relation: relation.into(),
            referrer_id: referrer_id.into(),
            endpoint_id: endpoint_id.into(),
            request_schema: None,
            response_schema: None,
        }
    }

    #[must_use]
    pub fn with_request_schema(mut self, schema: impl Into<String>) -> Self {
        self.request_schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_response_schema(mut self, schema: impl Into<String>) -> Self {
        self.response_schema = Some(schema.into());
        self
    }

    /// Response schema of this edge: override, then the relation's default,
    /// then the endpoint's default schema.
    #[must_use]
    pub fn effective_response_schema(
        &self,
        relation: &LinkRelation,
        endpoint_default: Option<&str>,
    ) -> Option<String> {
        self.response_schema
            .clone()
            .or_else(|| relation.response_schema.clone())
            .or_else(|| endpoint_default.map(str::to_string))
    }

    /// Request schema of this edge: override, then the relation's default.
    /// A save without either accepts the endpoint's default schema.
    #[must_use]
    pub fn effective_request_schema(
        &self,
        relation: &LinkRelation,
        endpoint_default: Option<&str>,
    ) -> Option<String> {
        self.request_schema
            .clone()
            .or_else(|| relation.request_schema.clone())
            .or_else(|| {
                if relation.verb == Verb::Save {
                    endpoint_default.map(str::to_string)
                } else {
                    None
                }
            })
    }
}

/// One node of an API's declarative path tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub id: ResourceId,
    /// Literal text or a segment containing `{name}` placeholders. Empty for the docroot.
    pub path_segment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
    #[serde(default)]
    pub children: Vec<ResourceTemplate>,
}

impl ResourceTemplate {
    pub fn new(id: impl Into<ResourceId>, path_segment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path_segment: path_segment.into(),
            default_schema: None,
            children: Vec::new(),
        }
    }

    /// The docroot (`/`) of an API.
    pub fn root() -> Self {
        Self::new("/", "")
    }

    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: ResourceTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the segment contains a parameter placeholder.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.path_segment.contains('{')
    }

    /// Depth-first walk from the docroot yielding `(full_path, template)` for every node.
    #[must_use]
    pub fn walk(&self) -> Vec<(String, &ResourceTemplate)> {
        let mut out = Vec::new();
        let mut stack = vec![("/".to_string(), self)];
        while let Some((path, node)) = stack.pop() {
            for child in node.children.iter().rev() {
                stack.push((join_path(&path, &child.path_segment), child));
            }
            out.push((path, node));
        }
        out
    }

    /// Find a template by id anywhere below (and including) this node.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ResourceTemplate> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Append a segment to a full path, treating `/` as the docroot.
#[must_use]
pub fn join_path(parent: &str, segment: &str) -> String {
    if segment.is_empty() {
        return parent.to_string();
    }
    if parent == "/" || parent.is_empty() {
        format!("/{segment}")
    } else {
        format!("{parent}/{segment}")
    }
}

/// A mounted REST API: base URI, resource tree and link graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    pub uri: String,
    #[serde(default)]
    pub title: String,
    pub root: ResourceTemplate,
    #[serde(default)]
    pub link_templates: Vec<LinkTemplate>,
}

impl Api {
    /// Create an API, trimming any trailing `/` from the base URI.
    pub fn new(uri: impl Into<String>, root: ResourceTemplate) -> Self {
        Self {
            uri: normalize_base_uri(&uri.into()),
            title: String::new(),
            root,
            link_templates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_link_template(mut self, link: LinkTemplate) -> Self {
        self.link_templates.push(link);
        self
    }

    /// Number of resource templates in the tree.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.root.walk().len()
    }
}

pub(crate) fn normalize_base_uri(uri: &str) -> String {
    uri.trim().trim_end_matches('/').to_string()
}
