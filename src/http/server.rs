//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, request gates)
//! - Run one exchange: rewrite target, transform headers, follow redirects
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - Everything derived from configuration is resolved once into `ProxySettings`
//! - The transport is a trait object so tests can script upstream replies
//! - Error responses carry the same CORS and diagnostic headers as proxied ones

use std::io;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{Method, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::validation::parse_upstream;
use crate::config::{ProxyConfig, RedirectConfig, ValidationError};
use crate::http::cookies::CookiePolicy;
use crate::http::middleware::{
    bypass_middleware, method_gate, preflight_middleware, CorsSettings, MethodPolicy,
};
use crate::http::redirect::RedirectFollower;
use crate::http::request::{
    build_outbound_headers, build_target_url, request_id, RequestOverrides, UuidRequestId,
};
use crate::http::response::{allow_origin, build_inbound_headers, ResponseExtras};
use crate::http::transport::{ProxyRequest, ReqwestTransport, Transport, TransportError};
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::observability::metrics;
use crate::routing::BypassRules;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Per-exchange inputs that never change after startup.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub upstream: Url,
    pub overrides: RequestOverrides,
    pub extras: ResponseExtras,
    pub cookies: CookiePolicy,
    pub redirects: RedirectConfig,
}

impl ProxySettings {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ValidationError> {
        let upstream = parse_upstream(&config.upstream.url)?;
        let overrides = RequestOverrides::from_config(&upstream, &config.upstream)?;
        let extras = ResponseExtras::new(&upstream, config.upstream.expose_upstream_header);

        Ok(Self {
            upstream,
            overrides,
            extras,
            cookies: config.cookies.clone(),
            redirects: config.redirects.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn Transport>,
    pub settings: Arc<ProxySettings>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that reaches upstream over a pooled `reqwest` client.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let transport = ReqwestTransport::new(&config.timeouts)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server over an arbitrary transport.
    pub fn with_transport(config: ProxyConfig, transport: Arc<dyn Transport>) -> Result<Self, ServerError> {
        let settings = Arc::new(ProxySettings::from_config(&config)?);
        let cors = Arc::new(CorsSettings::from_config(&config.cors)?);
        let bypass = Arc::new(BypassRules::from_patterns(config.bypass.paths.as_slice()));

        tracing::info!(
            upstream = %settings.upstream,
            cookie_mode = settings.cookies.mode(),
            max_hops = settings.redirects.max_hops,
            bypass_rules = config.bypass.paths.len(),
            "Proxy configured"
        );

        let state = AppState { transport, settings };
        let router = Self::build_router(&config, state, cors, bypass);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Upstream deadlines live in the transport so a slow upstream surfaces
    /// as a 502 with CORS and diagnostic headers.
    fn build_router(
        config: &ProxyConfig,
        state: AppState,
        cors: Arc<CorsSettings>,
        bypass: Arc<BypassRules>,
    ) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(
                MethodPolicy::from(config.methods),
                method_gate,
            ))
            .layer(middleware::from_fn_with_state(bypass, bypass_middleware))
            .layer(middleware::from_fn_with_state(cors, preflight_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// True if the inbound body should be relayed upstream.
fn carries_body(method: &Method, body: &Body) -> bool {
    !matches!(*method, Method::GET | Method::HEAD) && !body.is_end_stream()
}

/// Proxy one exchange to the fixed upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let settings = &state.settings;
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();

    let target = build_target_url(&settings.upstream, &parts.uri);
    let headers = build_outbound_headers(&parts.headers, &settings.overrides, &settings.cookies);
    let body = carries_body(&parts.method, &body).then_some(body);

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        target = %target,
        streaming_body = body.is_some(),
        "Proxying request"
    );

    let follower = RedirectFollower::new(state.transport.as_ref(), &settings.redirects);
    let outcome = follower
        .resolve(ProxyRequest {
            method: parts.method.clone(),
            url: target,
            headers,
            body,
        })
        .await;

    let origin = allow_origin(&parts.headers);
    let response = match outcome {
        Ok(resolved) => {
            metrics::record_redirect_hops(resolved.hops());
            if resolved.hops() > 0 {
                tracing::debug!(
                    request_id = %request_id,
                    hops = resolved.hops(),
                    final_url = ?resolved.final_url().map(Url::as_str),
                    "Followed redirects"
                );
            }

            let (mut head, body) = resolved.response.into_parts();
            head.headers = build_inbound_headers(&head.headers, origin, &settings.extras, &settings.cookies);
            Response::from_parts(head, body)
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Exchange failed");
            metrics::record_upstream_error(e.kind());

            let mut response = e.into_response();
            let headers = build_inbound_headers(response.headers(), origin, &settings.extras, &settings.cookies);
            *response.headers_mut() = headers;
            response
        }
    };

    metrics::record_request(parts.method.as_str(), response.status().as_u16(), start);
    response
}
