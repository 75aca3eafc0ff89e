//! Response handling and transformation.
//!
//! # Responsibilities
//! - Sanitize upstream response headers for the caller
//! - Attach CORS, diagnostic and cache headers
//! - Apply the `Set-Cookie` side of the cookie policy
//!
//! # Design Decisions
//! - Bodies are never touched here; they stream through unmodified
//! - Hop-by-hop headers and `content-length` are stripped automatically
//! - Event streams always get `cache-control: no-cache`

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::http::cookies::CookiePolicy;
use crate::security::headers::copy_end_to_end;

/// Diagnostic header naming this proxy.
pub const X_PROXIED_BY: HeaderName = HeaderName::from_static("x-proxied-by");

/// Diagnostic header naming the upstream host.
pub const X_PROXY_UPSTREAM: HeaderName = HeaderName::from_static("x-proxy-upstream");

const PROXY_NAME: &str = concat!("mirror-proxy/", env!("CARGO_PKG_VERSION"));

/// Static response-side additions, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct ResponseExtras {
    pub proxied_by: HeaderValue,
    pub upstream_host: Option<HeaderValue>,
}

impl ResponseExtras {
    pub fn new(upstream: &Url, expose_upstream: bool) -> Self {
        let upstream_host = if expose_upstream {
            upstream
                .host_str()
                .map(|host| match upstream.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
                .and_then(|host| HeaderValue::from_str(&host).ok())
        } else {
            None
        };

        Self {
            proxied_by: HeaderValue::from_static(PROXY_NAME),
            upstream_host,
        }
    }
}

/// `access-control-allow-origin` value: the caller's `Origin`, or `*`.
pub fn allow_origin(inbound: &HeaderMap) -> HeaderValue {
    inbound
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"))
}

/// True for `text/event-stream`, ignoring case and parameters.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/event-stream"))
        .unwrap_or(false)
}

/// Add `Origin` to `vary` unless it is already covered.
fn append_vary_origin(headers: &mut HeaderMap) {
    let covered = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|token| token == "*" || token.eq_ignore_ascii_case("origin"));

    if !covered {
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// Derive the caller-facing header set from the upstream one.
pub fn build_inbound_headers(
    upstream: &HeaderMap,
    allow_origin: HeaderValue,
    extras: &ResponseExtras,
    cookies: &CookiePolicy,
) -> HeaderMap {
    let mut excluded = vec![header::CONTENT_LENGTH];
    if !cookies.forwards_set_cookie() {
        excluded.push(header::SET_COOKIE);
    }
    let mut headers = copy_end_to_end(upstream, &excluded);

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    append_vary_origin(&mut headers);

    headers.insert(X_PROXIED_BY, extras.proxied_by.clone());
    if let Some(host) = &extras.upstream_host {
        headers.insert(X_PROXY_UPSTREAM, host.clone());
    }

    if is_event_stream(&headers) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    } else if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers
}
