//! Method gate.
//! Header-only deployments relay GET and HEAD and reject everything else.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::MethodConfig;
use crate::error::ProxyError;

#[derive(Debug, Clone, Copy)]
pub struct MethodPolicy {
    pub allow_request_body: bool,
}

impl From<MethodConfig> for MethodPolicy {
    fn from(config: MethodConfig) -> Self {
        Self {
            allow_request_body: config.allow_request_body,
        }
    }
}

impl MethodPolicy {
    pub fn permits(&self, method: &Method) -> bool {
        self.allow_request_body || matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

pub async fn method_gate(
    State(policy): State<MethodPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if policy.permits(req.method()) {
        return next.run(req).await;
    }

    tracing::debug!(method = %req.method(), path = %req.uri().path(), "Rejecting method in header-only mode");
    ProxyError::UnsupportedMethod(req.method().clone()).into_response()
}
