//! Schema prototypes and the compatibility predicate.
//!
//! The object runtime that owns schemas lives outside this crate. Routing only
//! needs a narrow view of a schema: which slots form its identity, which
//! relation slots it declares, and which schemas it extends. Every
//! compatibility decision made while routing goes through
//! [`SchemaService::is_compatible`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Scalar kind of a key slot, used to parse path parameter text back into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueKind {
    #[default]
    Text,
    Integer,
    Number,
    Boolean,
}

/// A slot that participates in a schema's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySlot {
    pub name: String,
    #[serde(default)]
    pub kind: ValueKind,
}

/// A relation declared by a schema, pointing at instances of `target_schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSlot {
    pub relation: String,
    pub target_schema: String,
    /// Path parameter name -> slot of the referrer holding its value, for
    /// parameters that do not share the slot's name.
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

impl RelationSlot {
    pub fn new(relation: impl Into<String>, target_schema: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            target_schema: target_schema.into(),
            bindings: BTreeMap::new(),
        }
    }

    /// Read path parameter `parameter` from the referrer slot `slot`.
    #[must_use]
    pub fn bind(mut self, parameter: impl Into<String>, slot: impl Into<String>) -> Self {
        self.bindings.insert(parameter.into(), slot.into());
        self
    }
}

/// The routing-relevant view of one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prototype {
    pub schema_uri: String,
    /// Directly declared base schemas.
    #[serde(default)]
    pub base_schemas: Vec<String>,
    #[serde(default)]
    pub key_slots: Vec<KeySlot>,
    #[serde(default)]
    pub relation_slots: Vec<RelationSlot>,
}

impl Prototype {
    pub fn new(schema_uri: impl Into<String>) -> Self {
        Self {
            schema_uri: schema_uri.into(),
            base_schemas: Vec::new(),
            key_slots: Vec::new(),
            relation_slots: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base_schemas.push(base.into());
        self
    }

    #[must_use]
    pub fn key_slot(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.key_slots.push(KeySlot {
            name: name.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn relation_slot(mut self, slot: RelationSlot) -> Self {
        self.relation_slots.push(slot);
        self
    }

    #[must_use]
    pub fn key_slot_names(&self) -> Vec<&str> {
        self.key_slots.iter().map(|k| k.name.as_str()).collect()
    }

    #[must_use]
    pub fn relation_slot_for(&self, relation: &str) -> Option<&RelationSlot> {
        self.relation_slots.iter().find(|s| s.relation == relation)
    }
}

/// Contract with the schema/type service.
pub trait SchemaService: Send + Sync {
    fn resolve_prototype(&self, schema_uri: &str) -> Option<Arc<Prototype>>;

    /// The "any document" placeholder schema.
    fn generic_document_schema_uri(&self) -> &str;

    fn generic_model_schema_uri(&self) -> &str;

    /// Schema of API description documents; these never carry surrogate keys.
    fn api_schema_uri(&self) -> &str;

    /// Whether `other` is `base` or transitively declares it as a base schema.
    fn is_assignable_from(&self, base: &str, other: &str) -> bool {
        if base == other {
            return true;
        }
        let mut seen = HashSet::new();
        let mut pending = vec![other.to_string()];
        while let Some(uri) = pending.pop() {
            if !seen.insert(uri.clone()) {
                continue;
            }
            let Some(prototype) = self.resolve_prototype(&uri) else {
                continue;
            };
            for parent in &prototype.base_schemas {
                if parent == base {
                    return true;
                }
                pending.push(parent.clone());
            }
        }
        false
    }

    /// `actual` may be used where `declared` is expected.
    fn is_compatible(&self, declared: &str, actual: &str) -> bool {
        declared == actual || self.is_assignable_from(declared, actual)
    }

    fn is_generic_document(&self, schema_uri: &str) -> bool {
        schema_uri == self.generic_document_schema_uri()
    }
}

/// In-memory [`SchemaService`] backed by a fixed prototype table.
#[derive(Debug, Clone)]
pub struct StaticSchemaService {
    prototypes: HashMap<String, Arc<Prototype>>,
    document_schema: String,
    model_schema: String,
    api_schema: String,
}

impl StaticSchemaService {
    pub fn new() -> Self {
        Self {
            prototypes: HashMap::new(),
            document_schema: "Document".to_string(),
            model_schema: "Model".to_string(),
            api_schema: "Api".to_string(),
        }
    }

    /// Override the well-known generic schema identifiers.
    #[must_use]
    pub fn with_generic_schemas(
        mut self,
        document: impl Into<String>,
        model: impl Into<String>,
        api: impl Into<String>,
    ) -> Self {
        self.document_schema = document.into();
        self.model_schema = model.into();
        self.api_schema = api.into();
        self
    }

    #[must_use]
    pub fn with_prototype(mut self, prototype: Prototype) -> Self {
        self.prototypes
            .insert(prototype.schema_uri.clone(), Arc::new(prototype));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl Default for StaticSchemaService {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaService for StaticSchemaService {
    fn resolve_prototype(&self, schema_uri: &str) -> Option<Arc<Prototype>> {
        self.prototypes.get(schema_uri).cloned()
    }

    fn generic_document_schema_uri(&self) -> &str {
        &self.document_schema
    }

    fn generic_model_schema_uri(&self) -> &str {
        &self.model_schema
    }

    fn api_schema_uri(&self) -> &str {
        &self.api_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemas() -> StaticSchemaService {
        StaticSchemaService::new()
            .with_prototype(Prototype::new("Person"))
            .with_prototype(Prototype::new("Employee").extends("Person"))
            .with_prototype(Prototype::new("Manager").extends("Employee"))
            .with_prototype(Prototype::new("Color"))
    }

    #[test]
    fn test_assignability_is_transitive() {
        let s = schemas();
        assert!(s.is_assignable_from("Person", "Manager"));
        assert!(s.is_assignable_from("Employee", "Manager"));
        assert!(!s.is_assignable_from("Manager", "Person"));
        assert!(!s.is_assignable_from("Person", "Color"));
    }

    #[test]
    fn test_compatibility_accepts_exact_and_subtypes() {
        let s = schemas();
        assert!(s.is_compatible("Color", "Color"));
        assert!(s.is_compatible("Person", "Employee"));
        assert!(!s.is_compatible("Employee", "Color"));
    }

    #[test]
    fn test_cyclic_bases_terminate() {
        let s = StaticSchemaService::new()
            .with_prototype(Prototype::new("A").extends("B"))
            .with_prototype(Prototype::new("B").extends("A"));
        assert!(!s.is_assignable_from("C", "A"));
        assert!(s.is_assignable_from("B", "A"));
    }

    #[test]
    fn test_relation_slot_lookup() {
        let p = Prototype::new("Player")
            .key_slot("id", ValueKind::Integer)
            .relation_slot(RelationSlot::new("team", "Team").bind("teamId", "currentTeam"));
        let slot = p.relation_slot_for("team").unwrap();
        assert_eq!(slot.bindings.get("teamId").map(String::as_str), Some("currentTeam"));
        assert_eq!(p.key_slot_names(), vec!["id"]);
    }
}
