//! # Hot Reload Module
//!
//! Watches an API definition file and republishes its navigator when the file
//! changes.
//!
//! ## Reload Process
//!
//! 1. **Detection** - the filesystem watcher reports a modify or create event
//! 2. **Parse** - the definition is read with [`load_api_definition`]
//! 3. **Build** - relations are registered and a new navigator is built
//! 4. **Publish** - the registry swaps in a new snapshot
//! 5. **Hook** - the caller's callback receives the new navigator
//!
//! ## Error Handling
//!
//! If the file fails to parse or the API fails to build, the error is logged
//! and the previous navigator stays published. Requests keep being served.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hypernav::hot_reload::watch_api;
//! use hypernav::link::RelationCatalog;
//! use hypernav::registry::ApiRegistry;
//! use hypernav::schema::StaticSchemaService;
//! use hypernav::services::Services;
//! use std::sync::Arc;
//!
//! let services = Services::new(
//!     Arc::new(StaticSchemaService::new()),
//!     Arc::new(RelationCatalog::new()),
//! );
//! let registry = Arc::new(ApiRegistry::new(services));
//! let watcher = watch_api("teams.yaml", Arc::clone(&registry), |nav| {
//!     println!("reloaded {}", nav.uri());
//! })?;
//! # drop(watcher);
//! # Ok::<(), notify::Error>(())
//! ```

use crate::api::load_api_definition;
use crate::registry::ApiRegistry;
use crate::router::ApiNavigator;
use anyhow::Context;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Load the definition at `path` into `registry`.
pub fn reload_from_file(path: &Path, registry: &ApiRegistry) -> anyhow::Result<Arc<ApiNavigator>> {
    let definition = load_api_definition(path)?;
    let api_uri = definition.api.uri.clone();
    registry
        .load_definition(definition)
        .with_context(|| format!("Failed to build API {api_uri} from {}", path.display()))
}

/// Watch `definition_path` and reload it into `registry` on every change.
///
/// The returned watcher must be kept alive for watching to continue.
pub fn watch_api<P, F>(
    definition_path: P,
    registry: Arc<ApiRegistry>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&Arc<ApiNavigator>) + Send + 'static,
{
    let path: PathBuf = definition_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload_from_file(&watch_path, &registry) {
                    Ok(navigator) => {
                        info!(
                            path = %watch_path.display(),
                            api_uri = %navigator.uri(),
                            "hot-reload: API definition applied"
                        );
                        on_reload(&navigator);
                    }
                    Err(e) => error!(
                        path = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: keeping previous API"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
