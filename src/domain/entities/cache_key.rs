//! Request identity and the cache key derived from it.

use sha2::{Digest, Sha256};
use std::fmt;

/// Namespace prefix shared by every response cache key.
pub const KEY_PREFIX: &str = "api_cache:";

/// Longest durable file stem, well under the common 255-byte filename limit
/// once the extension and temp-file decorations are added.
pub const MAX_FILE_STEM_LEN: usize = 200;

/// The parts of an inbound request the cache layer cares about.
///
/// Everything else about the request (headers, body, extensions) is invisible
/// to the cache: two requests with the same method, path and query are the
/// same cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

impl RequestIdentity {
    /// Creates a request identity.
    ///
    /// The method is upper-cased and an empty query is treated as absent, so
    /// `/bugs` and `/bugs?` resolve to the same key.
    pub fn new(method: impl AsRef<str>, path: impl Into<String>, query: Option<String>) -> Self {
        let path = path.into();
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            path: if path.is_empty() { "/".to_string() } else { path },
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Splits a raw `path?query` string into an identity.
    pub fn from_path_and_query(method: impl AsRef<str>, path_and_query: &str) -> Self {
        match path_and_query.split_once('?') {
            Some((path, query)) => Self::new(method, path, Some(query.to_string())),
            None => Self::new(method, path_and_query, None),
        }
    }

    /// Returns true if responses to this request may be read from or written to the cache.
    ///
    /// Only `GET` qualifies. Write requests always go straight to the handler.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// Full path including the query string, when present.
    pub fn full_path(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Derives the cache key addressing both cache tiers.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!("{}{}{}", KEY_PREFIX, self.method, self.full_path()))
    }
}

/// Deterministic key addressing a cached response in both tiers.
///
/// Format: `api_cache:<METHOD><path>[?<query>]`. The key depends only on the
/// request identity, so it is stable across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-formatted key, e.g. one read back from the admin CLI.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe stem used by the durable tier.
    ///
    /// Separators (`:` and `/`) become `_`, which also prevents a key from
    /// escaping the cache directory. Stems longer than [`MAX_FILE_STEM_LEN`]
    /// keep a readable prefix followed by `_` and the SHA-256 of the full key.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '_',
                other => other,
            })
            .collect();

        if stem.len() <= MAX_FILE_STEM_LEN {
            return stem;
        }

        let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
        let mut cut = MAX_FILE_STEM_LEN - digest.len() - 1;
        while !stem.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}_{}", &stem[..cut], digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let identity = RequestIdentity::new("get", "/api/bugs", Some("page=2".to_string()));
        assert_eq!(identity.cache_key().as_str(), "api_cache:GET/api/bugs?page=2");
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let with_empty = RequestIdentity::from_path_and_query("GET", "/api/bugs?");
        let without = RequestIdentity::from_path_and_query("GET", "/api/bugs");
        assert_eq!(with_empty.cache_key(), without.cache_key());
    }

    #[test]
    fn test_method_is_part_of_key() {
        let get = RequestIdentity::new("GET", "/api/bugs", None);
        let post = RequestIdentity::new("POST", "/api/bugs", None);
        assert_ne!(get.cache_key(), post.cache_key());
    }

    #[test]
    fn test_only_get_is_cacheable() {
        assert!(RequestIdentity::new("GET", "/x", None).is_cacheable());
        for method in ["POST", "PUT", "PATCH", "DELETE", "HEAD"] {
            assert!(!RequestIdentity::new(method, "/x", None).is_cacheable());
        }
    }

    #[test]
    fn test_file_stem_replaces_separators() {
        let key = RequestIdentity::new("GET", "/api/bugs/12", Some("a=b".to_string())).cache_key();
        assert_eq!(key.file_stem(), "api_cache_GET_api_bugs_12?a=b");
        assert!(!key.file_stem().contains('/'));
    }

    #[test]
    fn test_long_file_stem_is_capped_and_hashed() {
        let query = format!("q={}", "x".repeat(300));
        let key = RequestIdentity::new("GET", "/api/search", Some(query)).cache_key();
        let stem = key.file_stem();

        assert_eq!(stem.len(), MAX_FILE_STEM_LEN);
        assert!(stem.starts_with("api_cache_GET_api_search?q=xxx"));
        assert_eq!(stem, key.file_stem());
    }

    #[test]
    fn test_long_keys_sharing_a_prefix_get_distinct_stems() {
        let base = "x".repeat(300);
        let a = RequestIdentity::new("GET", "/api/search", Some(format!("q={base}a"))).cache_key();
        let b = RequestIdentity::new("GET", "/api/search", Some(format!("q={base}b"))).cache_key();

        assert_ne!(a.file_stem(), b.file_stem());
    }
}
