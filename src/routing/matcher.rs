//! Path matching for bypass rules.
//!
//! # Responsibilities
//! - Match exact paths, path prefixes and path suffixes
//! - Compile configured patterns into matchers
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.path
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path().starts_with(&self.prefix)
    }
}

/// Matches the request path suffix (e.g. a file extension).
#[derive(Debug, Clone)]
pub struct PathSuffixMatcher {
    suffix: String,
}

impl PathSuffixMatcher {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Matcher for PathSuffixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path().ends_with(&self.suffix)
    }
}

/// Compile one configured pattern.
///
/// `*.ext` → suffix, `/dir/` or `/dir*` → prefix, anything else → exact.
pub fn compile(pattern: &str) -> Box<dyn Matcher> {
    if let Some(suffix) = pattern.strip_prefix('*') {
        Box::new(PathSuffixMatcher::new(suffix))
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        Box::new(PathPrefixMatcher::new(prefix))
    } else if pattern.ends_with('/') {
        Box::new(PathPrefixMatcher::new(pattern))
    } else {
        Box::new(ExactPathMatcher::new(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::default()).unwrap()
    }

    #[test]
    fn test_exact_matcher() {
        let matcher = compile("/robots.txt");
        assert!(matcher.matches(&req("/robots.txt")));
        assert!(matcher.matches(&req("/robots.txt?x=1")));
        assert!(!matcher.matches(&req("/robots.txt/more")));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = compile("/static/");

        assert!(matcher.matches(&req("http://example.com/static/app.js")));
        assert!(!matcher.matches(&req("http://example.com/staticky")));

        let matcher = compile("/.well-known*");
        assert!(matcher.matches(&req("/.well-known/security.txt")));
    }

    #[test]
    fn test_suffix_matcher() {
        let matcher = compile("*.ico");
        assert!(matcher.matches(&req("/favicon.ico")));
        assert!(matcher.matches(&req("/deep/icon.ico")));
        assert!(!matcher.matches(&req("/favicon.icon")));
    }
}
