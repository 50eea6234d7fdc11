//! # API Registry
//!
//! Owns every mounted [`ApiNavigator`] and answers "which API owns this URI".
//!
//! ## Publication model
//!
//! The registry state is an immutable [`RegistrySnapshot`] behind an
//! [`ArcSwap`]. Readers load the current snapshot without locking; a load,
//! reload or unload clones the snapshot, applies the change and stores the new
//! one. Requests already holding the previous snapshot (or a navigator from
//! it) finish against that consistent state. Writers are serialized by a
//! mutex so two concurrent loads cannot lose each other's update.
//!
//! Navigators are built before the writer lock is taken, so a slow build never
//! blocks other writers for longer than a map clone.

use crate::api::{auto_link, Api, ApiDefinition};
use crate::dimensions::Dimensions;
use crate::dispatcher::DispatchRequest;
use crate::error::{NavError, NavResult};
use crate::keys::{DocumentKeyBuilder, Keys};
use crate::link::{LayeredRelations, Link, LinkRelationLoader};
use crate::model::Model;
use crate::router::{ApiNavigator, PrefixTree};
use crate::runtime_config::RuntimeConfig;
use crate::services::Services;
use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// One published state of the registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    navigators: HashMap<String, Arc<ApiNavigator>>,
    prefixes: PrefixTree<Arc<ApiNavigator>>,
}

impl RegistrySnapshot {
    /// Navigator owning `uri`, by longest base-URI prefix.
    #[must_use]
    pub fn navigator_for(&self, uri: &str) -> Option<&Arc<ApiNavigator>> {
        self.prefixes.get(uri)
    }

    /// Navigator mounted at exactly `base_uri`.
    #[must_use]
    pub fn navigator(&self, base_uri: &str) -> Option<&Arc<ApiNavigator>> {
        self.navigators.get(base_uri.trim_end_matches('/'))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.navigators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.navigators.is_empty()
    }
}

/// Registry of mounted APIs.
#[derive(Debug)]
pub struct ApiRegistry {
    services: Services,
    config: RuntimeConfig,
    snapshot: ArcSwap<RegistrySnapshot>,
    writer: Mutex<()>,
}

impl ApiRegistry {
    /// Registry with [`RuntimeConfig::default`].
    pub fn new(services: Services) -> Self {
        Self::with_config(services, RuntimeConfig::default())
    }

    pub fn with_config(services: Services, config: RuntimeConfig) -> Self {
        Self {
            services,
            config,
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            writer: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The current published state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Build a navigator for `api` and publish it, replacing any API mounted at
    /// the same base URI.
    ///
    /// On error nothing is published and the previous navigator stays active.
    pub fn load_api(&self, api: Api) -> NavResult<Arc<ApiNavigator>> {
        self.load_api_with(api, self.services.clone())
    }

    /// Auto-link the definition if requested, [`load_api`](Self::load_api) it,
    /// then register its relations with the shared relation loader.
    ///
    /// The definition's relations shadow the shared ones while the navigator
    /// is built. They reach the shared loader only once the navigator is
    /// published, so a rejected definition changes nothing.
    pub fn load_definition(&self, definition: ApiDefinition) -> NavResult<Arc<ApiNavigator>> {
        let ApiDefinition {
            mut api,
            relations,
            auto_link: run_auto_link,
        } = definition;

        let layered = Arc::new(LayeredRelations::new(
            relations,
            Arc::clone(&self.services.relations),
        ));
        if run_auto_link {
            let added = auto_link(&mut api, self.services.schemas.as_ref(), layered.as_ref());
            debug!(api_uri = %api.uri, added, "Auto-linked API definition");
        }

        let services = Services {
            relations: Arc::clone(&layered) as Arc<dyn LinkRelationLoader>,
            ..self.services.clone()
        };
        let navigator = self.load_api_with(api, services)?;

        for relation in layered.overlay() {
            if !self.services.relations.register(relation.clone()) {
                debug!(relation = %relation.uri, "Relation loader does not accept registrations");
            }
        }
        Ok(navigator)
    }

    fn load_api_with(&self, api: Api, services: Services) -> NavResult<Arc<ApiNavigator>> {
        let navigator = Arc::new(ApiNavigator::new(api, services, self.config)?);
        let base_uri = navigator.uri().to_string();

        let replaced = self.publish(|next| {
            next.prefixes
                .insert(&wildcard(&base_uri), Arc::clone(&navigator));
            next.navigators.insert(base_uri.clone(), Arc::clone(&navigator))
        });

        info!(
            api_uri = %base_uri,
            resources = navigator.resources().count(),
            links = navigator.link_count(),
            reloaded = replaced.is_some(),
            "API published"
        );
        Ok(navigator)
    }

    /// Remove the API mounted at `base_uri`.
    pub fn unload_api(&self, base_uri: &str) -> Option<Arc<ApiNavigator>> {
        let base_uri = base_uri.trim_end_matches('/');
        let removed = self.publish(|next| {
            next.prefixes.remove(&wildcard(base_uri));
            next.navigators.remove(base_uri)
        });
        if removed.is_some() {
            info!(api_uri = %base_uri, "API unloaded");
        }
        removed
    }

    /// The navigator of the API that owns `uri`.
    ///
    /// # Errors
    ///
    /// [`NavError::UnmanagedUri`] if no mounted API's base URI prefixes `uri`.
    pub fn get_parent_api_navigator(&self, uri: &str) -> NavResult<Arc<ApiNavigator>> {
        self.snapshot
            .load()
            .navigator_for(uri)
            .map(Arc::clone)
            .ok_or_else(|| NavError::UnmanagedUri {
                uri: uri.to_string(),
            })
    }

    /// Navigator mounted at exactly `base_uri`.
    #[must_use]
    pub fn api_navigator(&self, base_uri: &str) -> Option<Arc<ApiNavigator>> {
        self.snapshot.load().navigator(base_uri).map(Arc::clone)
    }

    /// Every mounted navigator, ordered by base URI.
    #[must_use]
    pub fn navigators(&self) -> Vec<Arc<ApiNavigator>> {
        let snapshot = self.snapshot.load();
        let mut out: Vec<Arc<ApiNavigator>> = snapshot.navigators.values().map(Arc::clone).collect();
        out.sort_by(|a, b| a.uri().cmp(b.uri()));
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Resolve `link` through the navigator owning `referrer_uri`, building
    /// keys with the registry so hrefs into other APIs get their surrogate keys.
    pub fn resolve_link(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
    ) -> NavResult<DispatchRequest> {
        self.get_parent_api_navigator(referrer_uri)?.resolve_link_with(
            link,
            referrer,
            referrer_uri,
            requested,
            parameter,
            self,
        )
    }

    /// [`ApiNavigator::visit_link`] through the navigator owning `referrer_uri`.
    pub fn visit_link(
        &self,
        link: &Link,
        referrer: &Arc<dyn Model>,
        referrer_uri: &str,
        requested: Option<&Dimensions>,
        parameter: Option<Arc<dyn Model>>,
    ) -> NavResult<Option<Arc<dyn Model>>> {
        if let Some(embedded) = &link.embedded {
            return Ok(Some(Arc::clone(embedded)));
        }
        self.get_parent_api_navigator(referrer_uri)?.visit_link_with(
            link,
            referrer,
            referrer_uri,
            requested,
            parameter,
            self,
        )
    }

    /// Clone the current snapshot, apply `change`, publish the result.
    fn publish<R>(&self, change: impl FnOnce(&mut RegistrySnapshot) -> R) -> R {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&self.snapshot.load());
        let out = change(&mut next);
        self.snapshot.store(Arc::new(next));
        out
    }
}

impl DocumentKeyBuilder for ApiRegistry {
    fn build_document_keys(&self, uri: &str, schema_uri: &str) -> Keys {
        let schemas = &self.services.schemas;
        let mut keys = Keys::new().with(
            schemas.generic_document_schema_uri(),
            Value::String(uri.to_string()),
        );
        if schema_uri == schemas.api_schema_uri() || schemas.is_generic_document(schema_uri) {
            return keys;
        }
        match self.get_parent_api_navigator(uri) {
            Ok(navigator) => {
                if let Some(key) = navigator.surrogate_key(uri, schema_uri) {
                    keys.insert(schema_uri, key);
                }
            }
            Err(_) => debug!(uri = %uri, "No API owns URI; document key only"),
        }
        keys
    }
}

fn wildcard(base_uri: &str) -> String {
    format!("{base_uri}/*")
}
