//! # Path Templates
//!
//! A path template is a URI with `{name}` placeholders, e.g.
//! `http://a.example/teams/{teamId}`. Compiling one produces both halves of a
//! bidirectional mapping:
//!
//! - **Match**: extract the named values from a concrete URI
//! - **Evaluate**: fill the placeholders to produce a concrete URI
//!
//! Templates without placeholders are *static*: their single URI is memoized and
//! matching is a string comparison rather than a regex run.
//!
//! Query strings and fragments are ignored when matching, and a trailing `/` is
//! stripped from both the template and the candidate URI so redirect-style
//! trailing slashes do not cause spurious mismatches.

use crate::error::{NavError, NavResult};
use crate::syntax::SyntaxFormatter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Most resource paths carry only a handful of parameters.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured `(name, value)` pairs in declaration order.
///
/// Names are shared with the compiled template, values are per-URI.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[allow(clippy::expect_used)]
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder regex is valid"));

#[derive(Debug, Clone)]
enum Matcher {
    Static(String),
    Pattern(Regex),
}

/// Piece of a template used during evaluation.
#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Param(Arc<str>),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    params: Vec<Arc<str>>,
    parts: Vec<Part>,
    matcher: Matcher,
}

impl PathTemplate {
    /// Compile a template string.
    ///
    /// Fails on unbalanced or nested braces and on empty placeholder names.
    pub fn compile(template: &str) -> NavResult<Self> {
        check_braces(template)?;
        let trimmed = trim_trailing_slash(template);

        let mut params = Vec::new();
        let mut parts = Vec::new();
        let mut pattern = String::with_capacity(trimmed.len() + 8);
        pattern.push('^');

        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(trimmed) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let literal = &trimmed[last..whole.start()];
            pattern.push_str(&regex::escape(literal));
            pattern.push_str("([^/]+)");
            if !literal.is_empty() {
                parts.push(Part::Literal(literal.to_string()));
            }
            let name: Arc<str> = Arc::from(name.as_str().trim());
            parts.push(Part::Param(Arc::clone(&name)));
            params.push(name);
            last = whole.end();
        }
        let tail = &trimmed[last..];
        if !tail.is_empty() {
            parts.push(Part::Literal(tail.to_string()));
        }
        pattern.push_str(&regex::escape(tail));
        pattern.push('$');

        let matcher = if params.is_empty() {
            Matcher::Static(trimmed.to_string())
        } else {
            let regex = Regex::new(&pattern).map_err(|e| NavError::InvalidTemplate {
                template: template.to_string(),
                reason: e.to_string(),
            })?;
            Matcher::Pattern(regex)
        };

        Ok(Self {
            source: template.to_string(),
            params,
            parts,
            matcher,
        })
    }

    /// The template text as compiled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn parameter_names(&self) -> &[Arc<str>] {
        &self.params
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.matcher, Matcher::Static(_))
    }

    /// Extract parameter values from `uri`, or `None` if the path does not fit.
    ///
    /// Captured values are percent-decoded.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<ParamVec> {
        let candidate = trim_trailing_slash(strip_query(uri));
        match &self.matcher {
            Matcher::Static(literal) => (literal == candidate).then(ParamVec::new),
            Matcher::Pattern(regex) => {
                let caps = regex.captures(candidate)?;
                let mut out = ParamVec::new();
                for (i, name) in self.params.iter().enumerate() {
                    let raw = caps.get(i + 1)?.as_str();
                    let value = urlencoding::decode(raw)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    out.push((Arc::clone(name), value));
                }
                Some(out)
            }
        }
    }

    #[must_use]
    pub fn is_match(&self, uri: &str) -> bool {
        match &self.matcher {
            Matcher::Static(literal) => literal == trim_trailing_slash(strip_query(uri)),
            Matcher::Pattern(regex) => regex.is_match(trim_trailing_slash(strip_query(uri))),
        }
    }

    /// Produce a concrete URI by substituting every placeholder.
    ///
    /// Values are rendered by `syntax` and percent-encoded. With `allow_nulls`
    /// an absent (or unformattable) value becomes an empty segment; otherwise it
    /// is an error. Static templates ignore `values`.
    pub fn evaluate(
        &self,
        values: &BTreeMap<String, Value>,
        allow_nulls: bool,
        syntax: &dyn SyntaxFormatter,
    ) -> NavResult<String> {
        if let Matcher::Static(literal) = &self.matcher {
            return Ok(literal.clone());
        }

        let mut out = String::with_capacity(self.source.len() + 16);
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Param(name) => {
                    match values.get(name.as_ref()).and_then(|v| syntax.format(v)) {
                        Some(text) => out.push_str(&urlencoding::encode(&text)),
                        None if allow_nulls => {}
                        None => {
                            return Err(NavError::MissingParameter {
                                template: self.source.clone(),
                                parameter: name.to_string(),
                            })
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

fn check_braces(template: &str) -> NavResult<()> {
    let mut open = false;
    let mut name_len = 0usize;
    for c in template.chars() {
        match c {
            '{' if open => return Err(invalid(template, "nested '{'")),
            '{' => {
                open = true;
                name_len = 0;
            }
            '}' if !open => return Err(invalid(template, "unmatched '}'")),
            '}' => {
                if name_len == 0 {
                    return Err(invalid(template, "empty parameter name"));
                }
                open = false;
            }
            '/' if open => return Err(invalid(template, "'/' inside a parameter")),
            c if open && !c.is_whitespace() => name_len += 1,
            _ => {}
        }
    }
    if open {
        return Err(invalid(template, "unclosed '{'"));
    }
    Ok(())
}

fn invalid(template: &str, reason: &str) -> NavError {
    NavError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

/// Drop any `?query` or `#fragment` suffix.
#[must_use]
pub fn strip_query(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    &uri[..end]
}

pub(crate) fn trim_trailing_slash(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches('/');
    if trimmed.is_empty() {
        uri
    } else {
        trimmed
    }
}
