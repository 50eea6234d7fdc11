//! Typed faults raised by routing and link resolution.
//!
//! Every failure in this crate is synchronous and carries the context a caller
//! needs to render a REST-style error response: the API base URI, the URI that
//! was requested and, for link failures, the relation id. Nothing here is
//! retried internally.

use crate::validator::ValidationIssue;
use http::StatusCode;
use std::fmt;

/// Broad classification of a [`NavError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The URI is not owned by any API, or no resource matches it.
    NotFound,
    /// Configuration or wiring error, or a parameter the endpoint does not
    /// accept; the link is not navigable as requested.
    Fatal,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::NotFound => write!(f, "NotFound"),
            FaultKind::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Errors produced by the API registry, navigators and path templates.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// No mounted API owns the URI.
    #[error("unmanaged resource: no API is mounted for '{uri}'")]
    UnmanagedUri { uri: String },

    /// The URI falls under an API but no resource node matches the remaining path.
    #[error("no resource in API '{api_uri}' matches '{uri}'")]
    NoMatch { api_uri: String, uri: String },

    /// A relation id has no Link Relation definition.
    #[error("link relation '{relation}' referenced by API '{api_uri}' could not be resolved")]
    UnresolvableRelation { api_uri: String, relation: String },

    /// The referrer's resource has no outgoing edge for the relation.
    #[error("relation '{relation}' has no endpoint from '{referrer_uri}' in API '{api_uri}'")]
    MissingEndpoint {
        api_uri: String,
        referrer_uri: String,
        relation: String,
    },

    /// The endpoint template could not be evaluated from the referrer.
    #[error("relation '{relation}' from '{referrer_uri}' in API '{api_uri}' has no href")]
    MissingHref {
        api_uri: String,
        referrer_uri: String,
        relation: String,
    },

    /// The parameter model's schema is not an allowed request schema at the endpoint.
    #[error(
        "parameter of schema '{schema}' is not allowed for relation '{relation}' at '{href}' in API '{api_uri}'"
    )]
    DisallowedParameter {
        api_uri: String,
        href: String,
        relation: String,
        schema: String,
    },

    /// A path template string could not be compiled.
    #[error("invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A required path template parameter was absent during evaluation.
    #[error("path template '{template}' is missing a value for '{parameter}'")]
    MissingParameter { template: String, parameter: String },

    /// The API definition failed structural validation.
    #[error("API '{api_uri}' is invalid: {} issue(s)", issues.len())]
    InvalidApi {
        api_uri: String,
        issues: Vec<ValidationIssue>,
    },

    /// The request dispatcher failed to serve a resolved link.
    #[error("dispatch failed for '{href}': {source}")]
    Dispatch {
        href: String,
        #[source]
        source: anyhow::Error,
    },
}

impl NavError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        match self {
            NavError::UnmanagedUri { .. } | NavError::NoMatch { .. } => FaultKind::NotFound,
            _ => FaultKind::Fatal,
        }
    }

    /// HTTP status a REST front end should answer with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            FaultKind::NotFound => StatusCode::NOT_FOUND,
            FaultKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The relation id involved, when the fault came from link resolution.
    #[must_use]
    pub fn relation(&self) -> Option<&str> {
        match self {
            NavError::UnresolvableRelation { relation, .. }
            | NavError::MissingEndpoint { relation, .. }
            | NavError::MissingHref { relation, .. }
            | NavError::DisallowedParameter { relation, .. } => Some(relation),
            _ => None,
        }
    }
}

pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_faults_map_to_404() {
        let err = NavError::UnmanagedUri {
            uri: "http://nowhere.example/x".to_string(),
        };
        assert_eq!(err.kind(), FaultKind::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = NavError::NoMatch {
            api_uri: "http://a.example".to_string(),
            uri: "http://a.example/missing".to_string(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_link_faults_expose_relation() {
        let err = NavError::MissingEndpoint {
            api_uri: "http://a.example".to_string(),
            referrer_uri: "http://a.example/teams".to_string(),
            relation: "members".to_string(),
        };
        assert_eq!(err.kind(), FaultKind::Fatal);
        assert_eq!(err.relation(), Some("members"));
        assert!(err.to_string().contains("members"));
    }

    #[test]
    fn test_disallowed_parameter_is_fatal() {
        let err = NavError::DisallowedParameter {
            api_uri: "http://a.example".to_string(),
            href: "http://a.example/teams/1".to_string(),
            relation: "update".to_string(),
            schema: "Color".to_string(),
        };
        assert_eq!(err.kind(), FaultKind::Fatal);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.relation(), Some("update"));
    }
}
