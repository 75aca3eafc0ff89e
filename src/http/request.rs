//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Rewrite the inbound target onto the fixed upstream
//! - Build the outbound header set (copy, override, cookie policy)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Only path and query come from the caller; scheme/host/port never do
//! - The outbound header set is built once and reused on every redirect hop

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::config::{UpstreamConfig, ValidationError};
use crate::http::cookies::CookiePolicy;
use crate::security::headers::{copy_end_to_end, is_hop_by_hop};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Inbound headers that are never copied verbatim to upstream.
const REQUEST_EXCLUDED: [HeaderName; 3] = [header::HOST, header::CONTENT_LENGTH, header::COOKIE];

/// Assigns a UUID v4 to requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID for logging.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Static request-side overrides, resolved once from configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub origin: Option<HeaderValue>,
    pub referer: Option<HeaderValue>,
    /// Used only when the caller sent no `User-Agent`.
    pub default_user_agent: Option<HeaderValue>,
    pub extra: Vec<(HeaderName, HeaderValue)>,
}

impl RequestOverrides {
    pub fn from_config(upstream: &Url, config: &UpstreamConfig) -> Result<Self, ValidationError> {
        let origin = upstream.origin().ascii_serialization();
        let value = |name: &str, raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| ValidationError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })
        };

        let mut overrides = RequestOverrides::default();
        if config.spoof_origin {
            overrides.origin = Some(value("origin", origin.as_str())?);
        }
        if config.spoof_referer {
            overrides.referer = Some(value("referer", format!("{}/", origin).as_str())?);
        }
        if !config.user_agent.is_empty() {
            overrides.default_user_agent = Some(value("user-agent", config.user_agent.as_str())?);
        }

        for (raw_name, raw_value) in &config.request_headers {
            let name = HeaderName::try_from(raw_name.as_str()).map_err(|e| {
                ValidationError::InvalidHeader {
                    name: raw_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            if is_hop_by_hop(&name) || REQUEST_EXCLUDED.contains(&name) {
                tracing::warn!(header = %name, "Ignoring request header override that may not cross the proxy");
                continue;
            }
            overrides.extra.push((name, value(raw_name.as_str(), raw_value.as_str())?));
        }

        Ok(overrides)
    }
}

/// Place the inbound path and query on the upstream URL.
pub fn build_target_url(upstream: &Url, uri: &Uri) -> Url {
    let mut target = upstream.clone();
    target.set_path(uri.path());
    target.set_query(uri.query());
    target.set_fragment(None);
    target
}

/// Derive the outbound header set from the inbound one.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    overrides: &RequestOverrides,
    cookies: &CookiePolicy,
) -> HeaderMap {
    let mut headers = copy_end_to_end(inbound, &REQUEST_EXCLUDED);

    if let Some(origin) = &overrides.origin {
        headers.insert(header::ORIGIN, origin.clone());
    }
    if let Some(referer) = &overrides.referer {
        headers.insert(header::REFERER, referer.clone());
    }
    if !headers.contains_key(header::USER_AGENT) {
        if let Some(agent) = &overrides.default_user_agent {
            headers.insert(header::USER_AGENT, agent.clone());
        }
    }
    for (name, value) in &overrides.extra {
        headers.insert(name.clone(), value.clone());
    }

    if let Some(cookie) = cookies.outbound_cookie(inbound) {
        headers.insert(header::COOKIE, cookie);
    }

    headers
}
