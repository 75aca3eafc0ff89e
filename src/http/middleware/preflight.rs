//! CORS preflight middleware.
//! Answers every OPTIONS request locally; upstream never sees it.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::{CorsConfig, ValidationError};
use crate::http::response::allow_origin;

/// Preflight defaults, converted to header values once.
#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allow_headers: HeaderValue,
    pub allow_methods: HeaderValue,
    pub max_age: HeaderValue,
}

impl CorsSettings {
    pub fn from_config(config: &CorsConfig) -> Result<Self, ValidationError> {
        let value = |name: &str, raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| ValidationError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            allow_headers: value("access-control-allow-headers", config.allow_headers.as_str())?,
            allow_methods: value("access-control-allow-methods", config.allow_methods.as_str())?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        // Default CorsConfig values are static ASCII.
        Self::from_config(&CorsConfig::default()).unwrap_or_else(|_| Self {
            allow_headers: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("*"),
            max_age: HeaderValue::from_static("600"),
        })
    }
}

/// Build the 204 preflight response for `inbound`.
pub fn preflight_response(inbound: &HeaderMap, cors: &CorsSettings) -> Response {
    let allow_headers = inbound
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| cors.allow_headers.clone());
    let allow_methods = inbound
        .get(header::ACCESS_CONTROL_REQUEST_METHOD)
        .cloned()
        .unwrap_or_else(|| cors.allow_methods.clone());

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin(inbound));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, allow_methods);
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, cors.max_age.clone());
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));

    response
}

pub async fn preflight_middleware(
    State(cors): State<Arc<CorsSettings>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "Answering CORS preflight");
    preflight_response(req.headers(), &cors)
}
