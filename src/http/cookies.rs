//! Cookie policy and the cookie-merge algorithm.
//!
//! # Responsibilities
//! - Select how cookies cross the proxy (per deployment, never per request)
//! - Merge caller cookies with the operator credential, credential last
//! - Drop tracking/analytics cookies and cap the serialized length
//!
//! # Design Decisions
//! - Later sources overwrite earlier values but keep the first-seen position
//! - Truncation is byte-level and not pair-aware (a trailing pair may be cut)

use axum::http::{header, HeaderMap, HeaderValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default cap on the serialized `Cookie` header, in bytes.
pub const DEFAULT_MAX_COOKIE_LENGTH: usize = 4096;

/// Cookie name prefixes dropped by default.
pub const DEFAULT_TRACKING_PREFIXES: [&str; 6] = ["_ga", "_gid", "_gcl_au", "__utm", "_hj", "apt."];

/// How cookies cross the proxy boundary, chosen once at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CookiePolicy {
    /// Caller cookies never reach upstream and upstream `Set-Cookie` never
    /// reaches the caller. The credential, if any, is the whole `Cookie` header.
    StripAndInject {
        #[serde(default)]
        credential: Option<String>,
    },

    /// Caller cookies are merged with the credential; upstream `Set-Cookie`
    /// values are forwarded unmodified.
    Merge {
        #[serde(default)]
        credential: Option<String>,

        #[serde(default = "default_max_length")]
        max_length: usize,

        #[serde(default = "default_tracking_prefixes")]
        tracking_prefixes: Vec<String>,
    },
}

fn default_max_length() -> usize {
    DEFAULT_MAX_COOKIE_LENGTH
}

fn default_tracking_prefixes() -> Vec<String> {
    DEFAULT_TRACKING_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for CookiePolicy {
    fn default() -> Self {
        CookiePolicy::Merge {
            credential: None,
            max_length: DEFAULT_MAX_COOKIE_LENGTH,
            tracking_prefixes: default_tracking_prefixes(),
        }
    }
}

impl CookiePolicy {
    /// The operator-injected credential, if configured.
    pub fn credential(&self) -> Option<&str> {
        match self {
            CookiePolicy::StripAndInject { credential } | CookiePolicy::Merge { credential, .. } => {
                credential.as_deref()
            }
        }
    }

    /// Replace the credential, keeping the mode.
    pub fn set_credential(&mut self, value: Option<String>) {
        match self {
            CookiePolicy::StripAndInject { credential } | CookiePolicy::Merge { credential, .. } => {
                *credential = value;
            }
        }
    }

    /// Configuration label of the active mode.
    pub fn mode(&self) -> &'static str {
        match self {
            CookiePolicy::StripAndInject { .. } => "strip_and_inject",
            CookiePolicy::Merge { .. } => "merge",
        }
    }

    /// Whether upstream `Set-Cookie` headers are relayed to the caller.
    pub fn forwards_set_cookie(&self) -> bool {
        matches!(self, CookiePolicy::Merge { .. })
    }

    /// Derive the single outbound `Cookie` header from the inbound headers.
    ///
    /// Returns `None` when no cookie should be sent.
    pub fn outbound_cookie(&self, inbound: &HeaderMap) -> Option<HeaderValue> {
        match self {
            CookiePolicy::StripAndInject { credential } => credential
                .as_deref()
                .filter(|c| !c.is_empty())
                .and_then(|c| HeaderValue::from_str(c).ok()),
            CookiePolicy::Merge {
                credential,
                max_length,
                tracking_prefixes,
            } => {
                let client = inbound
                    .get_all(header::COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok());
                let sources = client.chain(credential.as_deref());

                let merged = merge_cookies(sources, tracking_prefixes, *max_length);
                if merged.is_empty() {
                    return None;
                }
                HeaderValue::from_str(&merged).ok()
            }
        }
    }
}

/// Returns true if `name` starts with any tracking prefix.
pub fn is_tracking_cookie(name: &str, tracking_prefixes: &[String]) -> bool {
    tracking_prefixes.iter().any(|p| name.starts_with(p.as_str()))
}

/// Split a raw `Cookie` string into trimmed `(name, value)` pairs.
///
/// Segments without `=` or with an empty name are skipped.
fn parse_pairs(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split(';').filter_map(|segment| {
        let (name, value) = segment.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name, value.trim()))
    })
}

/// Merge raw cookie strings, lowest precedence first.
///
/// The operator credential must be the last source so it overrides any
/// caller cookie of the same name.
pub fn merge_cookies<'a, I>(sources: I, tracking_prefixes: &[String], max_length: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut jar: IndexMap<&str, &str> = IndexMap::new();

    for raw in sources {
        for (name, value) in parse_pairs(raw) {
            if is_tracking_cookie(name, tracking_prefixes) {
                continue;
            }
            // IndexMap::insert keeps the original slot for an existing key.
            jar.insert(name, value);
        }
    }

    let serialized = jar
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");

    truncate_to(serialized, max_length)
}

/// Cut `s` to at most `max` bytes, backing off to a char boundary.
fn truncate_to(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}
