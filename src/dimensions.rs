use crate::api::Verb;
use serde::{Deserialize, Serialize};

/// The full parameterization of one request.
///
/// Immutable once built; use [`Dimensions::to_builder`] to derive a variant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    schema_uri: Option<String>,
    verb: Option<Verb>,
    referrer_uri: Option<String>,
    query: Option<String>,
    locale: Option<String>,
    embedded_slots: Vec<String>,
    excluded_slots: Vec<String>,
    included_slots: Vec<String>,
}

impl Dimensions {
    #[must_use]
    pub fn builder() -> DimensionsBuilder {
        DimensionsBuilder::default()
    }

    #[must_use]
    pub fn to_builder(&self) -> DimensionsBuilder {
        DimensionsBuilder { inner: self.clone() }
    }

    #[must_use]
    pub fn schema_uri(&self) -> Option<&str> {
        self.schema_uri.as_deref()
    }

    #[must_use]
    pub fn verb(&self) -> Option<Verb> {
        self.verb
    }

    #[must_use]
    pub fn referrer_uri(&self) -> Option<&str> {
        self.referrer_uri.as_deref()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    #[must_use]
    pub fn embedded_slots(&self) -> &[String] {
        &self.embedded_slots
    }

    #[must_use]
    pub fn excluded_slots(&self) -> &[String] {
        &self.excluded_slots
    }

    #[must_use]
    pub fn included_slots(&self) -> &[String] {
        &self.included_slots
    }
}

/// Incremental builder for [`Dimensions`].
#[derive(Debug, Clone, Default)]
pub struct DimensionsBuilder {
    inner: Dimensions,
}

impl DimensionsBuilder {
    #[must_use]
    pub fn schema_uri(mut self, schema_uri: impl Into<String>) -> Self {
        self.inner.schema_uri = Some(schema_uri.into());
        self
    }

    #[must_use]
    pub fn verb(mut self, verb: Verb) -> Self {
        self.inner.verb = Some(verb);
        self
    }

    #[must_use]
    pub fn referrer_uri(mut self, referrer_uri: impl Into<String>) -> Self {
        self.inner.referrer_uri = Some(referrer_uri.into());
        self
    }

    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.inner.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.inner.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn embed(mut self, slot: impl Into<String>) -> Self {
        self.inner.embedded_slots.push(slot.into());
        self
    }

    #[must_use]
    pub fn exclude(mut self, slot: impl Into<String>) -> Self {
        self.inner.excluded_slots.push(slot.into());
        self
    }

    #[must_use]
    pub fn include(mut self, slot: impl Into<String>) -> Self {
        self.inner.included_slots.push(slot.into());
        self
    }

    /// Current schema, so callers can decide on defaults before building.
    #[must_use]
    pub fn current_schema_uri(&self) -> Option<&str> {
        self.inner.schema_uri.as_deref()
    }

    #[must_use]
    pub fn current_referrer_uri(&self) -> Option<&str> {
        self.inner.referrer_uri.as_deref()
    }

    #[must_use]
    pub fn build(self) -> Dimensions {
        self.inner
    }
}
