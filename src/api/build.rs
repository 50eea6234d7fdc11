use super::autolink::auto_link;
use super::types::{join_path, Api, LinkTemplate, ResourceId, ResourceTemplate};
use crate::error::{NavError, NavResult};
use crate::link::LinkRelationLoader;
use crate::schema::SchemaService;
use crate::validator::ValidationIssue;
use std::collections::HashMap;

/// A link declared by full paths, resolved to ids at build time.
#[derive(Debug, Clone)]
struct PathLink {
    referrer: String,
    relation: String,
    endpoint: String,
    request_schema: Option<String>,
    response_schema: Option<String>,
}

/// Incremental builder for an [`Api`].
///
/// Resources are addressed by full path (`/teams/{teamId}`); missing
/// intermediate nodes are created on the way. A node's id is its full path
/// unless set with [`ApiBuilder::resource_with_id`], which keeps ids stable
/// across reloads of the same definition.
///
/// ```rust
/// use hypernav::api::ApiBuilder;
///
/// let api = ApiBuilder::new("http://a.example/")
///     .title("Teams")
///     .resource("/teams/{teamId}", Some("Team"))
///     .link("/teams/{teamId}", "self", "/teams/{teamId}")
///     .build()
///     .unwrap();
/// assert_eq!(api.uri, "http://a.example");
/// assert_eq!(api.resource_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ApiBuilder {
    uri: String,
    title: String,
    root: ResourceTemplate,
    path_links: Vec<PathLink>,
    link_templates: Vec<LinkTemplate>,
}

impl ApiBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: String::new(),
            root: ResourceTemplate::root(),
            path_links: Vec::new(),
            link_templates: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Ensure a resource exists at `path`, setting its default schema if given.
    #[must_use]
    pub fn resource(mut self, path: &str, default_schema: Option<&str>) -> Self {
        let node = ensure_path(&mut self.root, path);
        if let Some(schema) = default_schema {
            node.default_schema = Some(schema.to_string());
        }
        self
    }

    /// Like [`ApiBuilder::resource`], with an explicit id for the final node.
    #[must_use]
    pub fn resource_with_id(
        mut self,
        path: &str,
        id: impl Into<ResourceId>,
        default_schema: Option<&str>,
    ) -> Self {
        let node = ensure_path(&mut self.root, path);
        node.id = id.into();
        if let Some(schema) = default_schema {
            node.default_schema = Some(schema.to_string());
        }
        self
    }

    /// Edge from the resource at `referrer_path` to the one at `endpoint_path`.
    #[must_use]
    pub fn link(self, referrer_path: &str, relation: &str, endpoint_path: &str) -> Self {
        self.link_with_schemas(referrer_path, relation, endpoint_path, None, None)
    }

    /// [`ApiBuilder::link`] with request/response schema overrides.
    #[must_use]
    pub fn link_with_schemas(
        mut self,
        referrer_path: &str,
        relation: &str,
        endpoint_path: &str,
        request_schema: Option<&str>,
        response_schema: Option<&str>,
    ) -> Self {
        self.path_links.push(PathLink {
            referrer: normalize_path(referrer_path),
            relation: relation.to_string(),
            endpoint: normalize_path(endpoint_path),
            request_schema: request_schema.map(str::to_string),
            response_schema: response_schema.map(str::to_string),
        });
        self
    }

    /// Edge between resource ids, added as is.
    #[must_use]
    pub fn link_template(mut self, link: LinkTemplate) -> Self {
        self.link_templates.push(link);
        self
    }

    /// Resolve path links to ids and produce the [`Api`].
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidApi`] if a link names a path with no resource.
    pub fn build(self) -> NavResult<Api> {
        let ids: HashMap<String, ResourceId> = self
            .root
            .walk()
            .into_iter()
            .map(|(path, template)| (path, template.id.clone()))
            .collect();

        let mut api = Api::new(self.uri, self.root).with_title(self.title);
        let mut issues = Vec::new();
        for link in self.path_links {
            let location = format!("link:{}", link.relation);
            let referrer = ids.get(&link.referrer);
            let endpoint = ids.get(&link.endpoint);
            for (path, found) in [(&link.referrer, referrer), (&link.endpoint, endpoint)] {
                if found.is_none() {
                    issues.push(ValidationIssue::new(
                        &location,
                        "unknown_path",
                        format!("no resource is declared at '{path}'"),
                    ));
                }
            }
            let (Some(referrer), Some(endpoint)) = (referrer, endpoint) else {
                continue;
            };
            let mut template = LinkTemplate::new(referrer.clone(), link.relation, endpoint.clone());
            template.request_schema = link.request_schema;
            template.response_schema = link.response_schema;
            api.link_templates.push(template);
        }
        if !issues.is_empty() {
            return Err(NavError::InvalidApi {
                api_uri: api.uri,
                issues,
            });
        }
        api.link_templates.extend(self.link_templates);
        Ok(api)
    }

    /// [`ApiBuilder::build`], then infer missing edges with [`auto_link`].
    pub fn build_auto_linked(
        self,
        schemas: &dyn SchemaService,
        relations: &dyn LinkRelationLoader,
    ) -> NavResult<Api> {
        let mut api = self.build()?;
        auto_link(&mut api, schemas, relations);
        Ok(api)
    }
}

/// `/a//b/` -> `/a/b`; the docroot is `/`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .fold("/".to_string(), |acc, segment| join_path(&acc, segment))
}

fn ensure_path<'a>(root: &'a mut ResourceTemplate, path: &str) -> &'a mut ResourceTemplate {
    let mut node = root;
    let mut full_path = "/".to_string();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        full_path = join_path(&full_path, segment);
        let index = match node.children.iter().position(|c| c.path_segment == segment) {
            Some(index) => index,
            None => {
                node.children
                    .push(ResourceTemplate::new(full_path.as_str(), segment));
                node.children.len() - 1
            }
        };
        node = &mut node.children[index];
    }
    node
}
