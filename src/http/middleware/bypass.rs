//! Bypass middleware.
//! Paths matched by the bypass rules never reach upstream.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::routing::BypassRules;

pub async fn bypass_middleware(
    State(rules): State<Arc<BypassRules>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !rules.bypasses(&req) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "Path bypasses the proxy");
    (StatusCode::NOT_FOUND, "Not proxied").into_response()
}
