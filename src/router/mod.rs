//! # Router Module
//!
//! Resolves absolute URIs to the resource nodes of a mounted API and follows
//! typed links between them.
//!
//! ## Overview
//!
//! - [`Resource`] is the compiled runtime form of one resource template, with
//!   its literal/variable child maps and its incoming and outgoing link indices
//! - [`ApiNavigator`] owns one API's resources, ranks match candidates for a
//!   URI and resolves links into dispatchable requests
//! - [`PrefixTree`] maps URI prefixes to values; the registry uses it to find
//!   the navigator that owns a URI
//!
//! ## Example
//!
//! ```rust
//! use hypernav::api::{ApiBuilder, LinkRelation, Verb};
//! use hypernav::link::RelationCatalog;
//! use hypernav::router::ApiNavigator;
//! use hypernav::runtime_config::RuntimeConfig;
//! use hypernav::schema::StaticSchemaService;
//! use hypernav::services::Services;
//! use std::sync::Arc;
//!
//! let api = ApiBuilder::new("http://a.example")
//!     .resource("/teams/{teamId}", Some("Team"))
//!     .link("/teams/{teamId}", "self", "/teams/{teamId}")
//!     .build()
//!     .unwrap();
//! let relations = RelationCatalog::with_relations([LinkRelation::new("self", Verb::Get)]);
//! let services = Services::new(Arc::new(StaticSchemaService::new()), Arc::new(relations));
//! let navigator = ApiNavigator::new(api, services, RuntimeConfig::default()).unwrap();
//!
//! let id = navigator.get_resource_template_id("http://a.example/teams/42").unwrap();
//! assert_eq!(id.as_str(), "/teams/{teamId}");
//! ```

mod core;
mod radix;
mod resource;
#[cfg(test)]
mod tests;

pub use core::{ApiNavigator, ResourceMatch};
pub use radix::PrefixTree;
pub use resource::{ResolvedLink, Resource};
