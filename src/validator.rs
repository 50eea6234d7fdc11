//! Structural validation of an [`Api`] before a navigator is built.
//!
//! Every issue is collected rather than stopping at the first, so an author
//! sees the whole list at once.

use crate::api::{Api, ResourceTemplate};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Where the issue occurred, e.g. `resource:/teams/{teamId}` or `link:members`
    pub location: String,
    /// Machine-readable kind, e.g. `dangling_endpoint`
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

pub fn log_issues(api_uri: &str, issues: &[ValidationIssue]) {
    for issue in issues {
        warn!(
            api_uri = %api_uri,
            location = %issue.location,
            kind = %issue.kind,
            "API validation issue: {}",
            issue.message
        );
    }
}

/// Check the base URI, resource tree and link templates of `api`.
#[must_use]
pub fn validate_api(api: &Api) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_base_uri(&api.uri, &mut issues);

    if !api.root.path_segment.is_empty() {
        issues.push(ValidationIssue::new(
            format!("resource:{}", api.root.id),
            "root_segment",
            format!(
                "docroot must have an empty path segment, found '{}'",
                api.root.path_segment
            ),
        ));
    }

    let mut ids = HashSet::new();
    for (path, template) in api.root.walk() {
        if !ids.insert(template.id.clone()) {
            issues.push(ValidationIssue::new(
                format!("resource:{path}"),
                "duplicate_id",
                format!("resource id '{}' is used more than once", template.id),
            ));
        }
        if template.id.as_str().is_empty() {
            issues.push(ValidationIssue::new(
                format!("resource:{path}"),
                "empty_id",
                "resource id must not be empty",
            ));
        }
        validate_children(&path, template, &mut issues);
    }

    for (i, link) in api.link_templates.iter().enumerate() {
        let location = format!("link[{i}]:{}", link.relation);
        if link.relation.trim().is_empty() {
            issues.push(ValidationIssue::new(
                &location,
                "empty_relation",
                "link template has no relation id",
            ));
        }
        if !ids.contains(&link.referrer_id) {
            issues.push(ValidationIssue::new(
                &location,
                "dangling_referrer",
                format!("referrer id '{}' is not in the resource tree", link.referrer_id),
            ));
        }
        if !ids.contains(&link.endpoint_id) {
            issues.push(ValidationIssue::new(
                &location,
                "dangling_endpoint",
                format!("endpoint id '{}' is not in the resource tree", link.endpoint_id),
            ));
        }
    }

    issues
}

fn validate_base_uri(uri: &str, issues: &mut Vec<ValidationIssue>) {
    match url::Url::parse(uri) {
        Ok(parsed) => {
            if !parsed.has_host() {
                issues.push(ValidationIssue::new(
                    "api",
                    "base_uri",
                    format!("base URI '{uri}' has no host"),
                ));
            }
            if parsed.query().is_some() || parsed.fragment().is_some() {
                issues.push(ValidationIssue::new(
                    "api",
                    "base_uri",
                    format!("base URI '{uri}' must not carry a query or fragment"),
                ));
            }
        }
        Err(e) => issues.push(ValidationIssue::new(
            "api",
            "base_uri",
            format!("base URI '{uri}' is not absolute: {e}"),
        )),
    }
}

fn validate_children(path: &str, template: &ResourceTemplate, issues: &mut Vec<ValidationIssue>) {
    let mut segments = HashSet::new();
    for child in &template.children {
        let location = format!("resource:{path} -> '{}'", child.path_segment);
        if child.path_segment.is_empty() {
            issues.push(ValidationIssue::new(
                &location,
                "empty_segment",
                format!("child '{}' has an empty path segment", child.id),
            ));
        }
        if child.path_segment.contains('/') {
            issues.push(ValidationIssue::new(
                &location,
                "segment_separator",
                "a path segment must not contain '/'",
            ));
        }
        if child.path_segment.matches('{').count() != child.path_segment.matches('}').count() {
            issues.push(ValidationIssue::new(
                &location,
                "unbalanced_braces",
                "placeholder braces are unbalanced",
            ));
        }
        if !segments.insert(child.path_segment.as_str()) {
            issues.push(ValidationIssue::new(
                &location,
                "duplicate_segment",
                "sibling resources share the same path segment",
            ));
        }
    }
}
