//! # Dispatcher Contract
//!
//! Link resolution never touches storage. Once a hypermedia target has been
//! resolved to a `(verb, keys, dimensions, parameter)` tuple it is handed to a
//! [`RequestDispatcher`], which fetches, saves or invokes it and returns the
//! resulting model unchanged to the caller of `visit_link`.
//!
//! Retry and timeout policy belong to the dispatcher's own transport.

use crate::api::Verb;
use crate::dimensions::Dimensions;
use crate::keys::Keys;
use crate::model::Model;
use std::sync::Arc;

/// A resolved hypermedia request, ready for dispatch.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub verb: Verb,
    pub keys: Keys,
    pub dimensions: Dimensions,
    pub parameter: Option<Arc<dyn Model>>,
    /// Target href the keys were derived from.
    pub href: String,
    /// Relation that produced this request.
    pub relation: String,
}

/// Contract with the generic request dispatcher.
pub trait RequestDispatcher: Send + Sync {
    /// Serve `request`. Verbs without a response body (e.g. delete) may return `None`.
    fn request(&self, request: DispatchRequest) -> anyhow::Result<Option<Arc<dyn Model>>>;
}

/// Dispatcher that refuses every request; for navigators used only for routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl RequestDispatcher for NoopDispatcher {
    fn request(&self, request: DispatchRequest) -> anyhow::Result<Option<Arc<dyn Model>>> {
        anyhow::bail!(
            "no dispatcher configured for {} {}",
            request.verb,
            request.href
        )
    }
}
