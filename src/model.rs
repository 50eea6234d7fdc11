//! The model contract consumed by link resolution.
//!
//! Models are built and validated by the object runtime; routing only reads
//! their URI, schema and slot values.

use serde_json::{Map, Value};
use std::fmt;

/// An opaque model instance.
pub trait Model: Send + Sync + fmt::Debug {
    fn uri(&self) -> Option<&str>;

    fn schema_uri(&self) -> &str;

    fn slot_value(&self, name: &str) -> Option<&Value>;

    fn contains_slot_value(&self, name: &str) -> bool {
        self.slot_value(name).is_some()
    }
}

/// A plain model backed by a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel {
    uri: Option<String>,
    schema_uri: String,
    slots: Map<String, Value>,
}

impl DocumentModel {
    pub fn new(schema_uri: impl Into<String>) -> Self {
        Self {
            uri: None,
            schema_uri: schema_uri.into(),
            slots: Map::new(),
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    /// Build from a JSON object; non-object values yield an empty slot map.
    pub fn from_json(schema_uri: impl Into<String>, value: Value) -> Self {
        let slots = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            uri: None,
            schema_uri: schema_uri.into(),
            slots,
        }
    }

    #[must_use]
    pub fn slots(&self) -> &Map<String, Value> {
        &self.slots
    }
}

impl Model for DocumentModel {
    fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    fn schema_uri(&self) -> &str {
        &self.schema_uri
    }

    fn slot_value(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    fn contains_slot_value(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}
