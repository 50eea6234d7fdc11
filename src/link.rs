//! Links carried by models and the Link Relation catalog.

use crate::api::LinkRelation;
use crate::model::Model;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Relation id every resource uses to refer to itself.
pub const SELF_RELATION: &str = "self";

/// A named relation on a model instance.
///
/// A link may already carry its target (embedded) or an explicit href; when it
/// carries neither the href is computed from the endpoint's path template.
#[derive(Debug, Clone)]
pub struct Link {
    pub relation: String,
    pub href: Option<String>,
    pub embedded: Option<Arc<dyn Model>>,
}

impl Link {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            href: None,
            embedded: None,
        }
    }

    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    #[must_use]
    pub fn with_embedded(mut self, target: Arc<dyn Model>) -> Self {
        self.embedded = Some(target);
        self
    }
}

/// Contract with the Link Relation loader.
pub trait LinkRelationLoader: Send + Sync {
    fn load_link_relation(&self, uri: &str) -> Option<Arc<LinkRelation>>;

    /// Make `relation` available to later lookups. Loaders that cannot
    /// accept definitions return `false`.
    fn register(&self, relation: LinkRelation) -> bool {
        let _ = relation;
        false
    }
}

type FallbackLoader = dyn Fn(&str) -> Option<LinkRelation> + Send + Sync;

/// Concurrent cache of Link Relations keyed by relation id.
///
/// Misses are forwarded to an optional fallback loader and the result cached.
#[derive(Default)]
pub struct RelationCatalog {
    relations: DashMap<String, Arc<LinkRelation>>,
    fallback: Option<Box<FallbackLoader>>,
}

impl RelationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with `relations`.
    pub fn with_relations(relations: impl IntoIterator<Item = LinkRelation>) -> Self {
        let catalog = Self::new();
        for relation in relations {
            catalog.insert(relation);
        }
        catalog
    }

    #[must_use]
    pub fn with_fallback<F>(mut self, loader: F) -> Self
    where
        F: Fn(&str) -> Option<LinkRelation> + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(loader));
        self
    }

    pub fn insert(&self, relation: LinkRelation) -> Option<Arc<LinkRelation>> {
        self.relations
            .insert(relation.uri.clone(), Arc::new(relation))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl fmt::Debug for RelationCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationCatalog")
            .field("relations", &self.relations.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl LinkRelationLoader for RelationCatalog {
    fn load_link_relation(&self, uri: &str) -> Option<Arc<LinkRelation>> {
        if let Some(found) = self.relations.get(uri) {
            return Some(Arc::clone(found.value()));
        }
        let loaded = self.fallback.as_ref().and_then(|load| load(uri))?;
        debug!(relation = %uri, verb = %loaded.verb, "Link relation loaded on demand");
        let loaded = Arc::new(loaded);
        self.relations.insert(uri.to_string(), Arc::clone(&loaded));
        Some(loaded)
    }

    fn register(&self, relation: LinkRelation) -> bool {
        self.insert(relation);
        true
    }
}

/// Relations from one API definition, consulted before a shared loader.
///
/// Lookups never write to the shared loader, so building against a layer
/// leaves it untouched until the caller decides to register the overlay.
pub struct LayeredRelations {
    overlay: HashMap<String, Arc<LinkRelation>>,
    base: Arc<dyn LinkRelationLoader>,
}

impl LayeredRelations {
    pub fn new(
        relations: impl IntoIterator<Item = LinkRelation>,
        base: Arc<dyn LinkRelationLoader>,
    ) -> Self {
        let overlay = relations
            .into_iter()
            .map(|r| (r.uri.clone(), Arc::new(r)))
            .collect();
        Self { overlay, base }
    }

    /// The overlay relations, for registration once the build succeeded.
    pub fn overlay(&self) -> impl Iterator<Item = &LinkRelation> {
        self.overlay.values().map(Arc::as_ref)
    }
}

impl fmt::Debug for LayeredRelations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredRelations")
            .field("overlay", &self.overlay.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl LinkRelationLoader for LayeredRelations {
    fn load_link_relation(&self, uri: &str) -> Option<Arc<LinkRelation>> {
        match self.overlay.get(uri) {
            Some(found) => Some(Arc::clone(found)),
            None => self.base.load_link_relation(uri),
        }
    }
}
