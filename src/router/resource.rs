//! Runtime resource node.
//!
//! A [`Resource`] is the compiled form of one [`ResourceTemplate`]. Besides its
//! path template it owns indices derived from the API's link templates:
//!
//! - **outgoing**: edges whose referrer is this node, keyed by relation id
//! - **incoming**: edges whose endpoint is this node, keyed by relation id,
//!   plus per-verb sets of relation ids, request schemas and response schemas
//!
//! The indices are computed once when the navigator is built and never mutated,
//! so every read is a lock-free lookup.

use crate::api::{LinkRelation, LinkTemplate, ResourceId, ResourceTemplate, Verb};
use crate::error::NavResult;
use crate::template::{ParamVec, PathTemplate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A link template paired with its resolved relation.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub template: LinkTemplate,
    pub relation: Arc<LinkRelation>,
}

impl ResolvedLink {
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.relation.verb
    }
}

/// One node of a navigator's resource tree.
#[derive(Debug, Clone)]
pub struct Resource {
    id: ResourceId,
    parent_id: Option<ResourceId>,
    path_segment: String,
    full_path: String,
    default_schema: Option<String>,
    /// Absolute template: API base URI + full path.
    template: PathTemplate,
    /// Compiled segment, present only for variable segments.
    segment: Option<PathTemplate>,
    child_ids: Vec<ResourceId>,
    literal_children: HashMap<String, ResourceId>,
    variable_children: BTreeMap<String, ResourceId>,
    outgoing: HashMap<String, Vec<ResolvedLink>>,
    incoming: HashMap<String, Vec<ResolvedLink>>,
    reference_relations: HashMap<Verb, BTreeSet<String>>,
    request_schemas: HashMap<Verb, BTreeSet<String>>,
    response_schemas: HashMap<Verb, BTreeSet<String>>,
}

impl Resource {
    /// Compile `template` at `full_path` and index every edge touching it.
    pub(crate) fn new(
        api_uri: &str,
        template: &ResourceTemplate,
        parent_id: Option<ResourceId>,
        full_path: String,
        links: &[ResolvedLink],
    ) -> NavResult<Self> {
        let absolute = format!("{api_uri}{full_path}");
        let path_template = PathTemplate::compile(&absolute)?;
        let segment = if template.is_variable() {
            Some(PathTemplate::compile(&template.path_segment)?)
        } else {
            None
        };

        let mut resource = Self {
            id: template.id.clone(),
            parent_id,
            path_segment: template.path_segment.clone(),
            full_path,
            default_schema: template.default_schema.clone(),
            template: path_template,
            segment,
            child_ids: Vec::with_capacity(template.children.len()),
            literal_children: HashMap::new(),
            variable_children: BTreeMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            reference_relations: HashMap::new(),
            request_schemas: HashMap::new(),
            response_schemas: HashMap::new(),
        };

        for child in &template.children {
            resource.register_child(child);
        }
        resource.index_links(links);
        Ok(resource)
    }

    fn register_child(&mut self, child: &ResourceTemplate) {
        self.child_ids.push(child.id.clone());
        if child.is_variable() {
            self.variable_children
                .insert(child.path_segment.clone(), child.id.clone());
        } else {
            self.literal_children
                .insert(child.path_segment.clone(), child.id.clone());
        }
    }

    fn index_links(&mut self, links: &[ResolvedLink]) {
        for link in links {
            if link.template.endpoint_id == self.id {
                let verb = link.verb();
                self.reference_relations
                    .entry(verb)
                    .or_default()
                    .insert(link.template.relation.clone());
                if let Some(schema) = link
                    .template
                    .effective_request_schema(&link.relation, self.default_schema.as_deref())
                {
                    self.request_schemas.entry(verb).or_default().insert(schema);
                }
                if let Some(schema) = link
                    .template
                    .effective_response_schema(&link.relation, self.default_schema.as_deref())
                {
                    self.response_schemas.entry(verb).or_default().insert(schema);
                }
                self.incoming
                    .entry(link.template.relation.clone())
                    .or_default()
                    .push(link.clone());
            }
            if link.template.referrer_id == self.id {
                self.outgoing
                    .entry(link.template.relation.clone())
                    .or_default()
                    .push(link.clone());
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&ResourceId> {
        self.parent_id.as_ref()
    }

    #[must_use]
    pub fn path_segment(&self) -> &str {
        &self.path_segment
    }

    /// Path below the API base URI, `/` for the docroot.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    #[must_use]
    pub fn path_template(&self) -> &PathTemplate {
        &self.template
    }

    #[must_use]
    pub fn child_ids(&self) -> &[ResourceId] {
        &self.child_ids
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }

    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.segment.is_some()
    }

    #[must_use]
    pub fn literal_children(&self) -> &HashMap<String, ResourceId> {
        &self.literal_children
    }

    #[must_use]
    pub fn variable_children(&self) -> &BTreeMap<String, ResourceId> {
        &self.variable_children
    }

    /// Whether a concrete path segment satisfies this node's segment.
    #[must_use]
    pub fn matches_segment(&self, segment: &str) -> bool {
        match &self.segment {
            Some(pattern) => pattern.is_match(segment),
            None => self.path_segment == segment,
        }
    }

    /// Parameters captured from a concrete segment, `None` if it does not fit.
    /// Literal nodes capture nothing.
    #[must_use]
    pub fn capture_segment(&self, segment: &str) -> Option<ParamVec> {
        match &self.segment {
            Some(pattern) => pattern.matches(segment),
            None => (self.path_segment == segment).then(ParamVec::new),
        }
    }

    /// Nodes with no edges in either direction are not match targets.
    #[must_use]
    pub fn has_links(&self) -> bool {
        !self.outgoing.is_empty() || !self.incoming.is_empty()
    }

    #[must_use]
    pub fn response_schemas(&self, verb: Verb) -> Option<&BTreeSet<String>> {
        self.response_schemas.get(&verb)
    }

    #[must_use]
    pub fn request_schemas(&self, verb: Verb) -> Option<&BTreeSet<String>> {
        self.request_schemas.get(&verb)
    }

    /// Relation ids of incoming edges for `verb`.
    #[must_use]
    pub fn reference_relations(&self, verb: Verb) -> Option<&BTreeSet<String>> {
        self.reference_relations.get(&verb)
    }

    /// Every response schema across all verbs.
    pub fn all_response_schemas(&self) -> impl Iterator<Item = &str> {
        self.response_schemas
            .values()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Verbs that at least one incoming edge allows here.
    #[must_use]
    pub fn allowed_verbs(&self) -> BTreeSet<Verb> {
        self.reference_relations.keys().copied().collect()
    }

    /// First outgoing edge for `relation`.
    #[must_use]
    pub fn outgoing_link(&self, relation: &str) -> Option<&ResolvedLink> {
        self.outgoing.get(relation).and_then(|links| links.first())
    }

    /// All outgoing edges for `relation`; more than one means polymorphic endpoints.
    #[must_use]
    pub fn outgoing_links(&self, relation: &str) -> &[ResolvedLink] {
        self.outgoing.get(relation).map_or(&[], Vec::as_slice)
    }

    /// Relation ids with an outgoing edge, sorted.
    #[must_use]
    pub fn outgoing_relations(&self) -> Vec<&str> {
        let mut rels: Vec<&str> = self.outgoing.keys().map(String::as_str).collect();
        rels.sort_unstable();
        rels
    }

    #[must_use]
    pub fn incoming_links(&self, relation: &str) -> &[ResolvedLink] {
        self.incoming.get(relation).map_or(&[], Vec::as_slice)
    }
}
