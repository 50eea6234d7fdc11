//! Identity of a model across several identity spaces.
//!
//! A [`Keys`] value maps a schema identifier to the identity the model has in
//! that schema's space: its public URI under the generic document schema, plus
//! zero or more surrogate keys recovered from the URI's path parameters.

use crate::schema::Prototype;
use crate::syntax::SyntaxFormatter;
use crate::template::ParamVec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identity formed from named sub-values; equal iff every component is equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(BTreeMap<String, Value>);

impl CompositeKey {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for CompositeKey {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One identity value: a scalar or a composite.
///
/// Composites serialize as objects, so they are tried first when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Composite(CompositeKey),
    Scalar(Value),
}

impl KeyValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            KeyValue::Scalar(v) => Some(v),
            KeyValue::Composite(_) => None,
        }
    }

    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeKey> {
        match self {
            KeyValue::Composite(c) => Some(c),
            KeyValue::Scalar(_) => None,
        }
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::Scalar(value)
    }
}

impl From<CompositeKey> for KeyValue {
    fn from(key: CompositeKey) -> Self {
        KeyValue::Composite(key)
    }
}

/// Ordered mapping of schema identifier to identity value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keys(BTreeMap<String, KeyValue>);

impl Keys {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, schema_uri: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(schema_uri, value);
        self
    }

    pub fn insert(&mut self, schema_uri: impl Into<String>, value: impl Into<KeyValue>) {
        self.0.insert(schema_uri.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, schema_uri: &str) -> Option<&KeyValue> {
        self.0.get(schema_uri)
    }

    #[must_use]
    pub fn contains(&self, schema_uri: &str) -> bool {
        self.0.contains_key(schema_uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn schema_uris(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Derives the [`Keys`] of the document at a URI.
///
/// Implemented by a single navigator (keys for its own API) and by the
/// registry (keys for any mounted API).
pub trait DocumentKeyBuilder {
    /// Keys for `uri` read as an instance of `schema_uri`. Never fails: the
    /// URI itself is always a key.
    fn build_document_keys(&self, uri: &str, schema_uri: &str) -> Keys;
}

/// Build the surrogate key of `prototype` from captured path parameters.
///
/// A single key slot yields a scalar, read from the parameter of the same name
/// or, failing that, from the only captured parameter. Several key slots yield
/// a composite and every slot must have a same-named parameter. Text is parsed
/// according to each slot's declared kind.
#[must_use]
pub fn surrogate_key(
    prototype: &Prototype,
    components: &ParamVec,
    syntax: &dyn SyntaxFormatter,
) -> Option<KeyValue> {
    let find = |name: &str| {
        components
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    };

    match prototype.key_slots.as_slice() {
        [] => None,
        [slot] => {
            let text = find(&slot.name).or_else(|| match components.as_slice() {
                [(_, only)] => Some(only.as_str()),
                _ => None,
            })?;
            syntax.parse(text, slot.kind).map(KeyValue::Scalar)
        }
        slots => {
            let mut composite = CompositeKey::new();
            for slot in slots {
                let value = syntax.parse(find(&slot.name)?, slot.kind)?;
                composite = composite.with(slot.name.clone(), value);
            }
            Some(KeyValue::Composite(composite))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;
    use crate::syntax::PlainSyntax;
    use serde_json::json;
    use std::sync::Arc;

    fn params(pairs: &[(&str, &str)]) -> ParamVec {
        pairs
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect()
    }

    #[test]
    fn test_composite_equality_is_componentwise() {
        let a = CompositeKey::new().with("season", 2024).with("team", "red");
        let b = CompositeKey::new().with("team", "red").with("season", 2024);
        let c = CompositeKey::new().with("team", "red").with("season", 2025);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_single_slot_reads_named_parameter() {
        let p = Prototype::new("Team").key_slot("teamId", ValueKind::Integer);
        let key = surrogate_key(&p, &params(&[("teamId", "42")]), &PlainSyntax).unwrap();
        assert_eq!(key, KeyValue::Scalar(json!(42)));
    }

    #[test]
    fn test_single_slot_falls_back_to_only_parameter() {
        let p = Prototype::new("Team").key_slot("id", ValueKind::Text);
        let key = surrogate_key(&p, &params(&[("teamId", "red")]), &PlainSyntax).unwrap();
        assert_eq!(key, KeyValue::Scalar(json!("red")));

        let two = params(&[("a", "1"), ("b", "2")]);
        assert!(surrogate_key(&p, &two, &PlainSyntax).is_none());
    }

    #[test]
    fn test_multiple_slots_build_composite() {
        let p = Prototype::new("Roster")
            .key_slot("teamId", ValueKind::Integer)
            .key_slot("season", ValueKind::Text);
        let key = surrogate_key(
            &p,
            &params(&[("teamId", "7"), ("season", "2024")]),
            &PlainSyntax,
        )
        .unwrap();
        let composite = key.as_composite().unwrap();
        assert_eq!(composite.get("teamId"), Some(&json!(7)));
        assert_eq!(composite.get("season"), Some(&json!("2024")));

        assert!(surrogate_key(&p, &params(&[("teamId", "7")]), &PlainSyntax).is_none());
    }

    #[test]
    fn test_keys_are_ordered_by_schema() {
        let keys = Keys::new()
            .with("Team", json!(42))
            .with("Document", json!("http://a.example/teams/42"));
        let order: Vec<&str> = keys.schema_uris().collect();
        assert_eq!(order, vec!["Document", "Team"]);
    }
}
