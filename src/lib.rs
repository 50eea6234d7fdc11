//! # hypernav
//!
//! **hypernav** is the routing and hypermedia-resolution core of a REST
//! resource runtime. Given declarative APIs (a tree of resource path templates
//! plus a graph of typed links between them) it:
//!
//! - compiles path templates into matchers and evaluators
//! - resolves an absolute URI to the API and resource node that own it
//! - reports which verbs and request/response schemas are legal at a node
//! - follows a named relation from a model to a dispatchable request,
//!   translating between public URIs and internal surrogate keys
//!
//! ## Architecture
//!
//! - **[`api`]** - declarative model, [`api::ApiBuilder`], definition files, auto-linking
//! - **[`template`]** - path templates
//! - **[`router`]** - resource nodes and the per-API [`router::ApiNavigator`]
//! - **[`registry`]** - mounted APIs and URI ownership lookup
//! - **[`keys`]**, **[`dimensions`]**, **[`link`]**, **[`model`]** - request vocabulary
//! - **[`schema`]**, **[`syntax`]**, **[`dispatcher`]** - collaborator contracts
//! - **[`validator`]** - structural checks run before a navigator is built
//! - **[`hot_reload`]** - reload definition files on change
//! - **[`logging`]**, **[`runtime_config`]** - ambient setup
//!
//! ## Example
//!
//! ```rust
//! use hypernav::api::{ApiBuilder, LinkRelation, Verb};
//! use hypernav::keys::KeyValue;
//! use hypernav::link::{Link, RelationCatalog};
//! use hypernav::model::{DocumentModel, Model};
//! use hypernav::registry::ApiRegistry;
//! use hypernav::schema::{Prototype, StaticSchemaService, ValueKind};
//! use hypernav::services::Services;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let schemas = StaticSchemaService::new()
//!     .with_prototype(Prototype::new("Team").key_slot("teamId", ValueKind::Integer));
//! let relations = RelationCatalog::with_relations([LinkRelation::new("self", Verb::Get)]);
//! let registry = ApiRegistry::new(Services::new(Arc::new(schemas), Arc::new(relations)));
//!
//! let api = ApiBuilder::new("http://a.example")
//!     .resource("/teams/{teamId}", Some("Team"))
//!     .link("/teams/{teamId}", "self", "/teams/{teamId}")
//!     .build()?;
//! registry.load_api(api)?;
//!
//! let uri = "http://a.example/teams/42";
//! let team: Arc<dyn Model> = Arc::new(DocumentModel::new("Team").with_uri(uri));
//! let request = registry.resolve_link(&Link::new("self"), &team, uri, None, None)?;
//!
//! assert_eq!(request.verb, Verb::Get);
//! assert_eq!(request.dimensions.schema_uri(), Some("Team"));
//! assert_eq!(request.keys.get("Team"), Some(&KeyValue::Scalar(json!(42))));
//! # Ok::<(), hypernav::error::NavError>(())
//! ```

pub mod api;
pub mod dimensions;
pub mod dispatcher;
pub mod error;
pub mod hot_reload;
pub mod keys;
pub mod link;
pub mod logging;
pub mod model;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod schema;
pub mod services;
pub mod syntax;
pub mod template;
pub mod validator;

pub use api::{Api, ApiBuilder, LinkRelation, LinkTemplate, ResourceId, ResourceTemplate, Verb};
pub use error::{FaultKind, NavError, NavResult};
pub use registry::ApiRegistry;
pub use router::ApiNavigator;
pub use services::Services;
