//! API navigator: URI matching and hypermedia resolution for one mounted API.
//!
//! # Matching
//!
//! A URI is split into path segments below the API base URI and the resource
//! tree is walked from the docroot. Every complete path through the tree is a
//! candidate, scored per level:
//!
//! | match at segment `i` | score |
//! |---|---|
//! | literal child | `10 + (i + 1)` |
//! | variable child | `5 + (i + 1)`, plus `1` on the final segment if the child is a leaf |
//!
//! A node reached on the final segment is only a candidate if it has at least
//! one link edge. Candidates are returned by descending score; equal scores
//! keep every candidate, ordered by [`TieBreak`].
//!
//! # Visiting links
//!
//! [`ApiNavigator::resolve_link`] turns `(link, referrer)` into a
//! [`DispatchRequest`]: relation, endpoint, href, response dimensions, keys and
//! the checked request parameter. [`ApiNavigator::visit_link`] adds the
//! embedded-target shortcut and hands the request to the dispatcher.

use super::resource::{ResolvedLink, Resource};
use crate::api::{join_path, Api, ResourceId, Verb};
use crate::dimensions::Dimensions;
use crate::dispatcher::DispatchRequest;
use crate::error::{NavError, NavResult};
use crate::keys::{surrogate_key, DocumentKeyBuilder, KeyValue, Keys};
use crate::link::Link;
use crate::model::Model;
use crate::runtime_config::{RuntimeConfig, TieBreak};
use crate::services::Services;
use crate::template::{strip_query, trim_trailing_slash, ParamVec};
use crate::validator::{log_issues, validate_api};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const LITERAL_SCORE: usize = 10;
const VARIABLE_SCORE: usize = 5;
const LEAF_BONUS: usize = 1;

/// One candidate resource for a URI.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMatch {
    pub score: usize,
    pub resource_id: ResourceId,
    /// Values captured by variable segments, outermost first
    pub path_params: ParamVec,
}

impl ResourceMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics when the same name is captured at
    /// several depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A referrer's outgoing edge for one relation.
struct Edge<'a> {
    referrer: ResourceMatch,
    link: &'a ResolvedLink,
    endpoint: &'a Resource,
}

/// Router and hypermedia resolver for one [`Api`].
///
/// Built once per load and never mutated; every method takes `&self`, so a
/// navigator can be shared behind an `Arc` by any number of request threads.
#[derive(Debug)]
pub struct ApiNavigator {
    api: Api,
    services: Services,
    config: RuntimeConfig,
    resources: HashMap<ResourceId, Resource>,
    root_id: ResourceId,
    link_count: usize,
}

impl ApiNavigator {
    /// Validate `api`, resolve its link relations and compile its resource tree.
    ///
    /// # Errors
    ///
    /// - [`NavError::InvalidApi`] if validation reports any issue
    /// - [`NavError::UnresolvableRelation`] for an unknown relation id when
    ///   `config.strict_relations` is set
    /// - [`NavError::InvalidTemplate`] if a path segment does not compile
    pub fn new(api: Api, services: Services, config: RuntimeConfig) -> NavResult<Self> {
        let issues = validate_api(&api);
        if !issues.is_empty() {
            log_issues(&api.uri, &issues);
            return Err(NavError::InvalidApi {
                api_uri: api.uri.clone(),
                issues,
            });
        }

        let links = resolve_relations(&api, &services, &config)?;

        let mut resources = HashMap::new();
        let mut stack = vec![(&api.root, None::<ResourceId>, "/".to_string())];
        while let Some((template, parent_id, full_path)) = stack.pop() {
            for child in template.children.iter().rev() {
                let child_path = join_path(&full_path, &child.path_segment);
                stack.push((child, Some(template.id.clone()), child_path));
            }
            let resource = Resource::new(&api.uri, template, parent_id, full_path, &links)?;
            resources.insert(template.id.clone(), resource);
        }

        let root_id = api.root.id.clone();
        info!(
            api_uri = %api.uri,
            title = %api.title,
            resources = resources.len(),
            links = links.len(),
            "API navigator built"
        );

        Ok(Self {
            link_count: links.len(),
            api,
            services,
            config,
            resources,
            root_id,
        })
    }

    #[must_use]
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Base URI of the API, without a trailing `/`.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.api.uri
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn root(&self) -> Option<&Resource> {
        self.resources.get(&self.root_id)
    }

    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Number of link edges whose relation resolved.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Rank every resource that can serve `uri`.
    ///
    /// An empty result is not an error here; see [`Self::get_resource_template_id`].
    ///
    /// # Errors
    ///
    /// [`NavError::UnmanagedUri`] if `uri` is not under this API's base URI.
    pub fn match_uri(&self, uri: &str) -> NavResult<Vec<ResourceMatch>> {
        let path = self.relative_path(uri).ok_or_else(|| NavError::UnmanagedUri {
            uri: uri.to_string(),
        })?;

        debug!(api_uri = %self.api.uri, uri = %uri, "Resource match attempt");
        let match_start = Instant::now();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut matches = Vec::new();
        if segments.is_empty() {
            matches.push(ResourceMatch {
                score: 0,
                resource_id: self.root_id.clone(),
                path_params: ParamVec::new(),
            });
        } else if let Some(root) = self.root() {
            self.collect_matches(root, &segments, 0, 0, &ParamVec::new(), &mut matches);
        }
        self.rank(&mut matches);

        let match_duration = match_start.elapsed();
        if match_duration > self.config.slow_match {
            warn!(
                api_uri = %self.api.uri,
                uri = %uri,
                candidates = matches.len(),
                duration_us = match_duration.as_micros(),
                "Slow resource matching detected"
            );
        } else {
            debug!(
                api_uri = %self.api.uri,
                uri = %uri,
                candidates = matches.len(),
                top = ?matches.first().map(|m| m.resource_id.as_str()),
                duration_us = match_duration.as_micros(),
                "Resource match complete"
            );
        }
        Ok(matches)
    }

    /// The top-ranked candidate for `uri`.
    ///
    /// # Errors
    ///
    /// [`NavError::UnmanagedUri`] or [`NavError::NoMatch`].
    pub fn best_match(&self, uri: &str) -> NavResult<ResourceMatch> {
        self.match_uri(uri)?.into_iter().next().ok_or_else(|| {
            warn!(api_uri = %self.api.uri, uri = %uri, "No resource matched");
            NavError::NoMatch {
                api_uri: self.api.uri.clone(),
                uri: uri.to_string(),
            }
        })
    }

    /// Id of the resource template that owns `uri`.
    pub fn get_resource_template_id(&self, uri: &str) -> NavResult<ResourceId> {
        self.best_match(uri).map(|m| m.resource_id)
    }

    /// The resource node that owns `uri`.
    pub fn get_resource(&self, uri: &str) -> NavResult<&Resource> {
        let best = self.best_match(uri)?;
        self.resources
            .get(&best.resource_id)
            .ok_or_else(|| NavError::NoMatch {
                api_uri: self.api.uri.clone(),
                uri: uri.to_string(),
            })
    }

    /// Path parameters of the best candidate whose Get response can be read
    /// as `target_schema`.
    ///
    /// Returns `Ok(None)` when no candidate serves a compatible schema.
    pub fn get_surrogate_key_components(
        &self,
        uri: &str,
        target_schema: &str,
    ) -> NavResult<Option<ParamVec>> {
        let schemas = &self.services.schemas;
        for candidate in self.match_uri(uri)? {
            let Some(resource) = self.resources.get(&candidate.resource_id) else {
                continue;
            };
            let compatible = resource
                .response_schemas(Verb::Get)
                .is_some_and(|set| set.iter().any(|s| schemas.is_compatible(target_schema, s)));
            if compatible {
                return Ok(Some(candidate.path_params));
            }
        }
        Ok(None)
    }

    /// Surrogate key of `uri` under `schema_uri`, if the schema declares key
    /// slots and a compatible resource captures them.
    #[must_use]
    pub fn surrogate_key(&self, uri: &str, schema_uri: &str) -> Option<KeyValue> {
        let prototype = self.services.schemas.resolve_prototype(schema_uri)?;
        let components = self
            .get_surrogate_key_components(uri, schema_uri)
            .ok()
            .flatten()?;
        surrogate_key(&prototype, &components, self.services.syntax.as_ref())
    }

    /// Endpoint of `relation` as seen from the resource owning `referrer_uri`.
    ///
    /// `Ok(None)` means the relation is not actionable from there.
    pub fn get_endpoint_resource(
        &self,
        relation: &str,
        referrer_uri: &str,
    ) -> NavResult<Option<&Resource>> {
        Ok(self
            .resolve_edge(relation, referrer_uri)?
            .map(|edge| edge.endpoint))
    }

    /// Response schema of the edge for `relation` from `referrer_uri`.
    pub fn default_response_schema(
        &self,
        relation: &str,
        referrer_uri: &str,
    ) -> NavResult<Option<String>> {
        Ok(self.resolve_edge(relation, referrer_uri)?.and_then(|edge| {
            edge.link
                .template
                .effective_response_schema(&edge.link.relation, edge.endpoint.default_schema())
        }))
    }

    /// Concrete URI of `relation`'s endpoint for `referrer`.
    ///
    /// `Ok(None)` when there is no edge or a path parameter has no value.
    pub fn evaluate_href(
        &self,
        referrer: &dyn Model,
        referrer_uri: &str,
        relation: &str,
    ) -> NavResult<Option<String>> {
        match self.resolve_edge(relation, referrer_uri)? {
            Some(edge) => self.href_for(&edge, referrer, relation),
            None => Ok(None),
        }
    }

    /// Href of every outgoing relation of the resource owning `referrer_uri`.
    ///
    /// Relations whose href cannot be produced are left out.
    pub fn hrefs(
        &self,
        referrer: &dyn Model,
        referrer_uri: &str,
    ) -> NavResult<BTreeMap<String, String>> {
        let best = self.best_match(referrer_uri)?;
        let mut out = BTreeMap::new();
        let Some(node) = self.resources.get(&best.resource_id) else {
            return Ok(out);
        };
        for relation in node.outgoing_relations() {
            let Some(link) = node.outgoing_link(relation) else {
                continue;
            };
            let Some(endpoint) = self.resources.get(&link.template.endpoint_id) else {
                continue;
            };
            let edge = Edge {
                referrer: best.clone(),
                link,
                endpoint,
            };
            if let Some(href) = self.href_for(&edge, referrer, relation)? {
                out.insert(relation.to_string(), href);
            }
        }
        Ok(out)
    }

    /// Resolve `link` from `referrer` into a request ready for dispatch.
    ///
    /// Keys are built by this navigator; use the registry to build keys for
    /// hrefs that point into other APIs.
    pub fn resolve_link(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
    ) -> NavResult<DispatchRequest> {
        self.resolve_link_with(link, referrer, referrer_uri, requested, parameter, self)
    }

    pub(crate) fn resolve_link_with(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
        key_builder: &dyn DocumentKeyBuilder,
    ) -> NavResult<DispatchRequest> {
        let schemas = &self.services.schemas;

        let Some(edge) = self.resolve_edge(&link.relation, referrer_uri)? else {
            if self
                .services
                .relations
                .load_link_relation(&link.relation)
                .is_none()
            {
                return Err(NavError::UnresolvableRelation {
                    api_uri: self.api.uri.clone(),
                    relation: link.relation.clone(),
                });
            }
            return Err(NavError::MissingEndpoint {
                api_uri: self.api.uri.clone(),
                referrer_uri: referrer_uri.to_string(),
                relation: link.relation.clone(),
            });
        };
        // The relation captured at build time, not the live catalog entry
        let relation = Arc::clone(&edge.link.relation);
        let verb = relation.verb;

        let href = match &link.href {
            Some(href) => href.clone(),
            None => self
                .href_for(&edge, referrer.as_ref(), &link.relation)?
                .ok_or_else(|| NavError::MissingHref {
                    api_uri: self.api.uri.clone(),
                    referrer_uri: referrer_uri.to_string(),
                    relation: link.relation.clone(),
                })?,
        };

        let mut builder = requested.map_or_else(Dimensions::builder, Dimensions::to_builder);
        if builder.current_schema_uri().is_none() {
            if let Some(schema) = edge
                .link
                .template
                .effective_response_schema(&relation, edge.endpoint.default_schema())
            {
                builder = builder.schema_uri(schema);
            }
        }
        let unspecific = builder
            .current_schema_uri()
            .map_or(true, |s| schemas.is_generic_document(s));
        if unspecific && same_document(&href, referrer_uri) {
            builder = builder.schema_uri(referrer.schema_uri());
        }
        if builder.current_referrer_uri().is_none() {
            builder = builder.referrer_uri(referrer_uri);
        }
        let dimensions = builder.verb(verb).build();

        let key_schema = dimensions
            .schema_uri()
            .unwrap_or_else(|| schemas.generic_document_schema_uri())
            .to_string();
        let keys = key_builder.build_document_keys(&href, &key_schema);

        let allowed = edge.endpoint.request_schemas(verb);
        let is_allowed = |schema: &str| {
            allowed.is_some_and(|set| set.iter().any(|a| schemas.is_compatible(a, schema)))
        };
        let parameter = match parameter {
            Some(parameter) if !is_allowed(parameter.schema_uri()) => {
                return Err(NavError::DisallowedParameter {
                    api_uri: self.api.uri.clone(),
                    href,
                    relation: link.relation.clone(),
                    schema: parameter.schema_uri().to_string(),
                });
            }
            Some(parameter) => Some(parameter),
            None if verb == Verb::Save && is_allowed(referrer.schema_uri()) => {
                Some(Arc::clone(referrer))
            }
            None => None,
        };

        debug!(
            api_uri = %self.api.uri,
            relation = %link.relation,
            verb = %verb,
            href = %href,
            schema = %key_schema,
            endpoint = %edge.endpoint.id(),
            has_parameter = parameter.is_some(),
            "Link resolved"
        );

        Ok(DispatchRequest {
            verb,
            keys,
            dimensions,
            parameter,
            href,
            relation: link.relation.clone(),
        })
    }

    /// Follow `link` from `referrer`: return the embedded target if the link
    /// carries one, otherwise resolve it and dispatch the request.
    pub fn visit_link(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
    ) -> NavResult<Option<Arc<dyn Model>>> {
        self.visit_link_with(link, referrer, referrer_uri, requested, parameter, self)
    }

    pub(crate) fn visit_link_with(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
        key_builder: &dyn DocumentKeyBuilder,
    ) -> NavResult<Option<Arc<dyn Model>>> {
        if let Some(embedded) = &link.embedded {
            debug!(relation = %link.relation, "Link target is embedded");
            return Ok(Some(Arc::clone(embedded)));
        }

        let request = self
            .resolve_link_with(link, referrer, referrer_uri, requested, parameter, key_builder)
            .inspect_err(|e| {
                warn!(
                    api_uri = %self.api.uri,
                    referrer_uri = %referrer_uri,
                    relation = %link.relation,
                    kind = %e.kind(),
                    error = %e,
                    "Link visit failed"
                );
            })?;

        let href = request.href.clone();
        self.services.dispatcher.request(request).map_err(|source| {
            warn!(
                api_uri = %self.api.uri,
                href = %href,
                relation = %link.relation,
                error = %source,
                "Dispatch failed"
            );
            NavError::Dispatch { href, source }
        })
    }

    /// Path of `uri` below the base URI.
    ///
    /// The authority compares case-insensitively. Base path segments compare
    /// whole, skipping empty segments the same way the registry's prefix tree
    /// does, so `//v2/x` is under a `/v2` base.
    fn relative_path<'u>(&self, uri: &'u str) -> Option<&'u str> {
        let uri = strip_query(uri);
        let base = self.api.uri.as_str();
        let authority_len = base
            .find("://")
            .map_or(0, |i| base[i + 3..].find('/').map_or(base.len(), |j| i + 3 + j));

        let head = uri.get(..authority_len)?;
        if !head.eq_ignore_ascii_case(&base[..authority_len]) {
            return None;
        }
        let mut rest = &uri[authority_len..];
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        for segment in base[authority_len..].split('/').filter(|s| !s.is_empty()) {
            let tail = rest.trim_start_matches('/').strip_prefix(segment)?;
            if !(tail.is_empty() || tail.starts_with('/')) {
                return None;
            }
            rest = tail;
        }
        Some(rest)
    }

    fn collect_matches(
        &self,
        node: &Resource,
        segments: &[&str],
        index: usize,
        score: usize,
        params: &ParamVec,
        out: &mut Vec<ResourceMatch>,
    ) {
        let Some(segment) = segments.get(index) else {
            return;
        };
        let last = index + 1 == segments.len();
        let depth = index + 1;

        if let Some(child) = node
            .literal_children()
            .get(*segment)
            .and_then(|id| self.resources.get(id))
        {
            let score = score + LITERAL_SCORE + depth;
            self.descend(child, segments, index, score, params.clone(), out);
        }

        for child_id in node.variable_children().values() {
            let Some(child) = self.resources.get(child_id) else {
                continue;
            };
            let Some(captured) = child.capture_segment(segment) else {
                continue;
            };
            let mut score = score + VARIABLE_SCORE + depth;
            if last && child.is_leaf() {
                score += LEAF_BONUS;
            }
            let mut params = params.clone();
            params.extend(captured);
            self.descend(child, segments, index, score, params, out);
        }
    }

    fn descend(
        &self,
        child: &Resource,
        segments: &[&str],
        index: usize,
        score: usize,
        params: ParamVec,
        out: &mut Vec<ResourceMatch>,
    ) {
        if index + 1 < segments.len() {
            self.collect_matches(child, segments, index + 1, score, &params, out);
        } else if child.has_links() {
            out.push(ResourceMatch {
                score,
                resource_id: child.id().clone(),
                path_params: params,
            });
        }
    }

    fn rank(&self, matches: &mut [ResourceMatch]) {
        match self.config.tie_break {
            TieBreak::Discovery => matches.sort_by(|a, b| b.score.cmp(&a.score)),
            TieBreak::Lexical => matches.sort_by(|a, b| {
                b.score.cmp(&a.score).then_with(|| {
                    self.full_path_of(&a.resource_id)
                        .cmp(self.full_path_of(&b.resource_id))
                })
            }),
        }
    }

    fn full_path_of(&self, id: &ResourceId) -> &str {
        self.resources.get(id).map_or("", Resource::full_path)
    }

    /// First candidate for `referrer_uri` with an outgoing edge for `relation`.
    fn resolve_edge(&self, relation: &str, referrer_uri: &str) -> NavResult<Option<Edge<'_>>> {
        let candidates = self.match_uri(referrer_uri)?;
        if candidates.is_empty() {
            return Err(NavError::NoMatch {
                api_uri: self.api.uri.clone(),
                uri: referrer_uri.to_string(),
            });
        }
        for candidate in candidates {
            let Some(node) = self.resources.get(&candidate.resource_id) else {
                continue;
            };
            let Some(link) = node.outgoing_link(relation) else {
                continue;
            };
            let Some(endpoint) = self.resources.get(&link.template.endpoint_id) else {
                continue;
            };
            return Ok(Some(Edge {
                referrer: candidate,
                link,
                endpoint,
            }));
        }
        Ok(None)
    }

    /// Evaluate the endpoint template of `edge`.
    ///
    /// Each parameter is read from, in order: the referrer slot bound to it by
    /// the referrer schema's relation slot, the same-named referrer slot, the
    /// same-named parameter captured from the referrer URI.
    fn href_for(
        &self,
        edge: &Edge<'_>,
        referrer: &dyn Model,
        relation: &str,
    ) -> NavResult<Option<String>> {
        let template = edge.endpoint.path_template();
        let prototype = self
            .services
            .schemas
            .resolve_prototype(referrer.schema_uri());
        let relation_slot = prototype
            .as_deref()
            .and_then(|p| p.relation_slot_for(relation));

        let mut values = BTreeMap::new();
        for name in template.parameter_names() {
            let bound = relation_slot
                .and_then(|slot| slot.bindings.get(name.as_ref()))
                .and_then(|slot_name| referrer.slot_value(slot_name));
            let value = bound
                .or_else(|| referrer.slot_value(name))
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| {
                    edge.referrer
                        .get_path_param(name)
                        .map(|v| Value::String(v.to_string()))
                });
            if let Some(value) = value {
                values.insert(name.to_string(), value);
            }
        }

        match template.evaluate(&values, false, self.services.syntax.as_ref()) {
            Ok(href) => Ok(Some(href)),
            Err(NavError::MissingParameter { parameter, .. }) => {
                debug!(
                    api_uri = %self.api.uri,
                    relation = %relation,
                    parameter = %parameter,
                    "No value for endpoint parameter"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl DocumentKeyBuilder for ApiNavigator {
    fn build_document_keys(&self, uri: &str, schema_uri: &str) -> Keys {
        let schemas = &self.services.schemas;
        let mut keys = Keys::new().with(
            schemas.generic_document_schema_uri(),
            Value::String(uri.to_string()),
        );
        if schema_uri == schemas.api_schema_uri() || schemas.is_generic_document(schema_uri) {
            return keys;
        }
        if let Some(key) = self.surrogate_key(uri, schema_uri) {
            keys.insert(schema_uri, key);
        }
        keys
    }
}

fn resolve_relations(
    api: &Api,
    services: &Services,
    config: &RuntimeConfig,
) -> NavResult<Vec<ResolvedLink>> {
    let mut resolved = Vec::with_capacity(api.link_templates.len());
    for template in &api.link_templates {
        match services.relations.load_link_relation(&template.relation) {
            Some(relation) => resolved.push(ResolvedLink {
                template: template.clone(),
                relation,
            }),
            None if config.strict_relations => {
                return Err(NavError::UnresolvableRelation {
                    api_uri: api.uri.clone(),
                    relation: template.relation.clone(),
                });
            }
            None => warn!(
                api_uri = %api.uri,
                relation = %template.relation,
                referrer = %template.referrer_id,
                endpoint = %template.endpoint_id,
                "Skipping link with unknown relation"
            ),
        }
    }
    Ok(resolved)
}

fn same_document(a: &str, b: &str) -> bool {
    trim_trailing_slash(strip_query(a)) == trim_trailing_slash(strip_query(b))
}
