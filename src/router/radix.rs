//! Segment prefix tree for URI ownership lookup
//!
//! The registry needs to answer "which API owns this URI" once per request,
//! independent of how many APIs are mounted. [`PrefixTree`] stores patterns
//! split into segments, where the first segment is the lowercased
//! `scheme://authority` and the rest are path segments:
//!
//! ```text
//! http://a.example/*          ->  ["http://a.example"] + wildcard
//! http://a.example/v2/*       ->  ["http://a.example", "v2"] + wildcard
//! ```
//!
//! A pattern ending in `/*` owns its own prefix and every URI below it.
//! Lookup walks the candidate URI once and returns the value of the deepest
//! wildcard passed on the way, so `http://a.example/v2/teams` resolves to the
//! `v2` API even though `http://a.example/*` is also registered.
//!
//! ## Performance
//!
//! Lookup is O(k) in the number of URI segments; each step is one hash lookup.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::template::strip_query;

const WILDCARD: &str = "*";

#[derive(Debug, Clone)]
struct PrefixNode<V> {
    children: HashMap<Box<str>, PrefixNode<V>>,
    /// Value for the exact pattern ending at this node
    exact: Option<V>,
    /// Value for `<pattern>/*` ending at this node
    wildcard: Option<V>,
}

impl<V> Default for PrefixNode<V> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            exact: None,
            wildcard: None,
        }
    }
}

impl<V> PrefixNode<V> {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.exact.is_none() && self.wildcard.is_none()
    }

    fn remove(&mut self, segments: &[Cow<'_, str>], wildcard: bool) -> Option<V> {
        let Some((first, rest)) = segments.split_first() else {
            return if wildcard {
                self.wildcard.take()
            } else {
                self.exact.take()
            };
        };
        let child = self.children.get_mut(&**first)?;
        let removed = child.remove(rest, wildcard);
        if child.is_empty() {
            self.children.remove(&**first);
        }
        removed
    }
}

/// Prefix tree mapping URI patterns to values.
///
/// Cloning copies the whole tree; the registry relies on this to build a new
/// snapshot while readers keep using the old one.
#[derive(Debug, Clone)]
pub struct PrefixTree<V> {
    root: PrefixNode<V>,
    len: usize,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self {
            root: PrefixNode::default(),
            len: 0,
        }
    }
}

impl<V> PrefixTree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `pattern`, returning the value it replaces.
    ///
    /// A pattern ending in `/*` matches its prefix and everything below it;
    /// any other pattern matches only itself.
    pub fn insert(&mut self, pattern: &str, value: V) -> Option<V> {
        let (segments, wildcard) = split_pattern(pattern);
        let mut node = &mut self.root;
        for segment in &segments {
            node = node.children.entry(Box::from(&**segment)).or_default();
        }
        let slot = if wildcard {
            &mut node.wildcard
        } else {
            &mut node.exact
        };
        let previous = slot.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Remove the value stored under exactly `pattern`.
    pub fn remove(&mut self, pattern: &str) -> Option<V> {
        let (segments, wildcard) = split_pattern(pattern);
        let removed = self.root.remove(&segments, wildcard);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Longest-prefix lookup: an exact pattern wins, then the deepest wildcard.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&V> {
        let segments = split_uri(uri);
        let mut node = &self.root;
        let mut best = node.wildcard.as_ref();
        for segment in &segments {
            match node.children.get(&**segment) {
                Some(child) => {
                    node = child;
                    if let Some(value) = node.wildcard.as_ref() {
                        best = Some(value);
                    }
                }
                None => return best,
            }
        }
        node.exact.as_ref().or(best)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn split_pattern(pattern: &str) -> (Vec<Cow<'_, str>>, bool) {
    let mut segments = split_uri(pattern);
    let wildcard = segments.last().is_some_and(|s| s == WILDCARD);
    if wildcard {
        segments.pop();
    }
    (segments, wildcard)
}

/// Split into `[scheme://authority, path segments...]`.
///
/// The authority is lowercased; empty path segments are skipped so trailing
/// and doubled slashes do not change ownership.
fn split_uri(uri: &str) -> Vec<Cow<'_, str>> {
    let uri = strip_query(uri);
    let (authority, path) = match uri.find("://") {
        Some(scheme_end) => {
            let after = scheme_end + 3;
            let path_start = uri[after..].find('/').map_or(uri.len(), |i| after + i);
            (&uri[..path_start], &uri[path_start..])
        }
        None => ("", uri),
    };

    let mut segments = Vec::with_capacity(path.matches('/').count() + 1);
    segments.push(if authority.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(authority.to_ascii_lowercase())
    } else {
        Cow::Borrowed(authority)
    });
    segments.extend(
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(Cow::Borrowed),
    );
    segments
}
