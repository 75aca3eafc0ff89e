//! Errors surfaced to the caller of a proxied exchange.
//!
//! Every variant is terminal for the current exchange and renders as a
//! plain-text body with a matching status code.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Methods a header-only deployment accepts.
pub const HEADER_ONLY_METHODS: &str = "GET, HEAD, OPTIONS";

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The active deployment cannot relay a request body.
    #[error("method {0} is not supported by this proxy; only GET and HEAD are relayed")]
    UnsupportedMethod(Method),

    /// DNS, TLS, connect or read failure on any hop.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Hop limit reached while upstream kept redirecting.
    #[error("redirect limit of {hops} hops exceeded without reaching a final response")]
    RedirectExhausted { hops: usize },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::RedirectExhausted { .. } => StatusCode::LOOP_DETECTED,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UnsupportedMethod(_) => "unsupported_method",
            ProxyError::UpstreamUnreachable(_) => "upstream_unreachable",
            ProxyError::RedirectExhausted { .. } => "redirect_exhausted",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, self.to_string()).into_response();

        if let ProxyError::UnsupportedMethod(_) = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(HEADER_ONLY_METHODS));
        }

        response
    }
}
