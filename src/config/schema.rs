//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::http::cookies::CookiePolicy;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The fixed upstream and the static request overrides sent to it.
    pub upstream: UpstreamConfig,

    /// Cookie policy, tagged by `mode`.
    pub cookies: CookiePolicy,

    /// Manual redirect following.
    pub redirects: RedirectConfig,

    /// Which inbound methods are relayed.
    pub methods: MethodConfig,

    /// CORS preflight defaults.
    pub cors: CorsConfig,

    /// Paths that are never proxied.
    pub bypass: BypassConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute upstream URL. Only its scheme, host and port are used; the
    /// path and query always come from the inbound request.
    pub url: String,

    /// Send `Origin: <upstream origin>` instead of the caller's.
    pub spoof_origin: bool,

    /// Send `Referer: <upstream origin>/` instead of the caller's.
    pub spoof_referer: bool,

    /// `User-Agent` used only when the caller sent none. Empty disables it.
    pub user_agent: String,

    /// Extra request headers; these win over anything the caller sent.
    pub request_headers: IndexMap<String, String>,

    /// Add `x-proxy-upstream: <host>` to responses.
    pub expose_upstream_header: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
            spoof_origin: true,
            spoof_referer: true,
            user_agent: concat!("mirror-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
            request_headers: IndexMap::new(),
            expose_upstream_header: true,
        }
    }
}

/// Redirect handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Maximum number of redirects followed per exchange.
    pub max_hops: usize,

    /// On a final 404 for a path without a trailing slash, try once more
    /// with the slash appended.
    pub retry_trailing_slash: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_hops: 5,
            retry_trailing_slash: false,
        }
    }
}

/// Method handling.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct MethodConfig {
    /// Relay request bodies (POST/PUT/PATCH/DELETE). When false only
    /// GET and HEAD are proxied and everything else gets 405.
    pub allow_request_body: bool,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            allow_request_body: true,
        }
    }
}

/// CORS preflight defaults, used when the preflight does not ask for
/// specific headers or a method.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_headers: String,
    pub allow_methods: String,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_headers: "content-type, authorization, x-requested-with".to_string(),
            allow_methods: "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS".to_string(),
            max_age_secs: 600,
        }
    }
}

/// Paths answered locally with 404 instead of being proxied.
///
/// Patterns: `/exact/path`, `/prefix/` or `/prefix*`, and `*.suffix`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BypassConfig {
    pub paths: Vec<String>,
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed per upstream hop until response headers are ready, in
    /// seconds. Body streaming is not bounded by it.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
