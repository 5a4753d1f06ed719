//! Dotted-path addressing over a flat label map.
//!
//! # Responsibilities
//! - Build field paths (`http.routers.web.rule`, `prefixes[2]`)
//! - Resolve a path against the ordered namespace prefixes
//! - Discover map keys and list indices present beneath a path
//!
//! # Design Decisions
//! - Lookups scan the flat map; no intermediate tree is built
//! - First prefix holding an exact key wins for scalar values
//! - Key and index discovery is the union over all prefixes, sorted

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A path relative to the namespace prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPath(String);

impl LabelPath {
    /// The empty path, addressing the namespace prefix itself.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Child path for a struct field or map key.
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Child path for a list element.
    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully-qualified label key under `prefix`.
    pub fn qualify(&self, prefix: &str) -> String {
        match (prefix.is_empty(), self.0.is_empty()) {
            (true, _) => self.0.clone(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}.{}", prefix, self.0),
        }
    }
}

impl fmt::Display for LabelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of a label map scoped by namespace prefixes.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    labels: &'a HashMap<String, String>,
    prefixes: &'a [&'a str],
}

impl<'a> Lookup<'a> {
    pub fn new(labels: &'a HashMap<String, String>, prefixes: &'a [&'a str]) -> Self {
        Self { labels, prefixes }
    }

    /// Returns `(key, value)` for the first prefix that holds `path` exactly.
    pub fn value(&self, path: &LabelPath) -> Option<(String, &'a str)> {
        self.prefixes.iter().find_map(|prefix| {
            let key = path.qualify(prefix);
            self.labels.get(&key).map(|v| (key, v.as_str()))
        })
    }

    /// True if any label sits at or beneath `path`.
    pub fn has_subtree(&self, path: &LabelPath) -> bool {
        self.prefixes.iter().any(|prefix| {
            let base = path.qualify(prefix);
            self.labels
                .keys()
                .any(|key| key == &base || extends(key, &base).is_some())
        })
    }

    /// Distinct map keys directly beneath `path` (`<path>.<key>...`).
    pub fn keys(&self, path: &LabelPath) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for prefix in self.prefixes {
            let base = path.qualify(prefix);
            for key in self.labels.keys() {
                let Some(rest) = extends(key, &base) else { continue };
                let rest = if base.is_empty() {
                    rest
                } else {
                    let Some(rest) = rest.strip_prefix('.') else { continue };
                    rest
                };
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                if end > 0 {
                    found.insert(rest[..end].to_string());
                }
            }
        }
        found
    }

    /// Distinct list indices directly beneath `path` (`<path>[<i>]...`).
    pub fn indices(&self, path: &LabelPath) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        for prefix in self.prefixes {
            let base = path.qualify(prefix);
            for key in self.labels.keys() {
                let Some(rest) = extends(key, &base) else { continue };
                let Some(rest) = rest.strip_prefix('[') else { continue };
                let Some(close) = rest.find(']') else { continue };
                if let Ok(i) = rest[..close].parse::<usize>() {
                    found.insert(i);
                }
            }
        }
        found
    }
}

/// If `key` extends `base` with a `.` or `[` segment, returns the remainder
/// starting at that separator. An empty `base` is extended by every key.
fn extends<'k>(key: &'k str, base: &str) -> Option<&'k str> {
    let rest = key.strip_prefix(base)?;
    if base.is_empty() || rest.starts_with('.') || rest.starts_with('[') {
        Some(rest)
    } else {
        None
    }
}
