//! Virtual URIs: `scheme://authority/path?query`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::{WikiError, WikiResult};

/// Query key selecting the backing store.
pub const SOURCE_PARAM: &str = "source";

/// A decomposed virtual URI.
///
/// `authority` names a workspace, `path` is always `/`-rooted, and `query`
/// holds pre-parsed parameters. Percent-decoding is left to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualUri {
    scheme: String,
    authority: String,
    path: String,
    query: BTreeMap<String, String>,
}

impl VirtualUri {
    /// Build a URI from its parts. A relative or empty path is rooted.
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl AsRef<str>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path: rooted(path.as_ref()),
            query: BTreeMap::new(),
        }
    }

    /// Attach a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Replace the query with a pre-parsed map.
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Parse `scheme://authority/path?query`.
    pub fn parse(input: &str) -> WikiResult<Self> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| WikiError::invalid_uri(format!("missing scheme in {input:?}")))?;
        if scheme.is_empty() {
            return Err(WikiError::invalid_uri(format!("empty scheme in {input:?}")));
        }

        let (rest, query) = match rest.split_once('?') {
            Some((head, query)) => (head, parse_query(query)),
            None => (rest, BTreeMap::new()),
        };
        // Fragments carry nothing for us.
        let rest = rest.split('#').next().unwrap_or(rest);

        let (authority, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, "/"),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            path: rooted(path),
            query,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Look up a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The normalized `source` selector: trimmed, lowercase, empty if absent.
    pub fn source(&self) -> String {
        self.param(SOURCE_PARAM)
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default()
    }
}

impl FromStr for VirtualUri {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VirtualUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)?;
        let mut sep = '?';
        for (key, value) in &self.query {
            write!(f, "{sep}{key}={value}")?;
            sep = '&';
        }
        Ok(())
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
