//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Send one request to one URL and hand back the raw response
//! - Stream request and response bodies without buffering them
//!
//! # Design Decisions
//! - Automatic redirects are disabled; `http::redirect` follows them by hand
//! - No response caching at this layer
//! - Each hop is bounded by the request timeout until response headers
//!   arrive; streaming bodies are not cut off afterwards
//! - Object-safe trait so the server can hold any transport behind `Arc`

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Response},
};
use bytes::Bytes;
use futures_util::{future::BoxFuture, stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::config::TimeoutConfig;

/// One outbound request: method, absolute target, headers, optional body.
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("{}", describe(.0))]
    Request(#[from] reqwest::Error),

    #[error("no response headers within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Render an error together with its source chain.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Sends a single request. Never follows redirects.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: ProxyRequest) -> BoxFuture<'static, Result<Response<Body>, TransportError>>;
}

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .no_proxy()
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: ProxyRequest) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
        let client = self.client.clone();
        let request_timeout = self.request_timeout;

        Box::pin(async move {
            let ProxyRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut builder = client.request(method, url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(relay_body(body));
            }

            let upstream = tokio::time::timeout(request_timeout, builder.send())
                .await
                .map_err(|_| TransportError::Timeout(request_timeout))??;

            let mut response = Response::new(Body::empty());
            *response.status_mut() = upstream.status();
            *response.headers_mut() = upstream.headers().clone();
            *response.body_mut() = Body::from_stream(upstream.bytes_stream());
            Ok(response)
        })
    }
}

/// Pump the inbound body into a channel-backed stream `reqwest` can own.
///
/// If the upstream side stops reading, the pump task ends on the next send.
fn relay_body(body: Body) -> reqwest::Body {
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, io::Error>>(8);

    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(io::Error::other);
            let failed = chunk.is_err();
            if tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    });

    reqwest::Body::wrap_stream(stream::poll_fn(move |cx| rx.poll_recv(cx)))
}
