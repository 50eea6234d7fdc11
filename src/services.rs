use crate::dispatcher::{NoopDispatcher, RequestDispatcher};
use crate::link::LinkRelationLoader;
use crate::schema::SchemaService;
use crate::syntax::{PlainSyntax, SyntaxFormatter};
use std::fmt;
use std::sync::Arc;

/// The external collaborators a navigator calls into.
///
/// Cloning shares the same collaborators.
#[derive(Clone)]
pub struct Services {
    pub schemas: Arc<dyn SchemaService>,
    pub relations: Arc<dyn LinkRelationLoader>,
    pub syntax: Arc<dyn SyntaxFormatter>,
    pub dispatcher: Arc<dyn RequestDispatcher>,
}

impl Services {
    /// Services with [`PlainSyntax`] and a dispatcher that refuses requests.
    pub fn new(schemas: Arc<dyn SchemaService>, relations: Arc<dyn LinkRelationLoader>) -> Self {
        Self {
            schemas,
            relations,
            syntax: Arc::new(PlainSyntax),
            dispatcher: Arc::new(NoopDispatcher),
        }
    }

    #[must_use]
    pub fn with_syntax(mut self, syntax: Arc<dyn SyntaxFormatter>) -> Self {
        self.syntax = syntax;
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn RequestDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("document_schema", &self.schemas.generic_document_schema_uri())
            .finish_non_exhaustive()
    }
}
