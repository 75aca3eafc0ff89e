//! Bypass rule lookup.
//!
//! # Responsibilities
//! - Store compiled bypass matchers
//! - Decide whether a request is proxied at all
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over patterns (acceptable for typical rule counts)
//! - Any match wins; order does not matter

use axum::body::Body;
use axum::http::Request;

use crate::routing::matcher::{compile, Matcher};

/// Paths that are answered locally instead of proxied.
#[derive(Debug, Default)]
pub struct BypassRules {
    matchers: Vec<Box<dyn Matcher>>,
}

impl BypassRules {
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            matchers: patterns
                .iter()
                .map(|p| p.as_ref())
                .filter(|p| !p.is_empty())
                .map(compile)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// True if the request must not reach upstream.
    pub fn bypasses(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().any(|m| m.matches(req))
    }
}
