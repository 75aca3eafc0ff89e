//! Manual redirect following.
//!
//! # States
//! - Requesting: a request to the current URL is in flight
//! - Redirected: a 3xx with a usable `Location` was received
//! - Done: a final response (or an unfollowable redirect) is in hand
//! - Exhausted: the hop limit was reached while still redirecting
//!
//! # State Transitions
//! ```text
//! Requesting → Done:       non-3xx, or 3xx without a usable Location
//! Requesting → Redirected: 3xx with a Location and hops < max_hops
//! Requesting → Exhausted:  3xx with a Location and hops == max_hops
//! Redirected → Requesting: same header set, resolved Location
//! ```
//!
//! # Design Decisions
//! - Outbound headers are never recomputed per hop
//! - The inbound body goes out on the first hop only; it cannot be replayed
//! - `303 See Other` switches to GET; other codes keep the method
//! - The trailing-slash retry is a single extra request, never recursive

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Response, StatusCode},
};
use url::Url;

use crate::config::RedirectConfig;
use crate::error::ProxyError;
use crate::http::transport::{ProxyRequest, Transport};

/// A final response and the URLs visited to reach it.
pub struct Resolved {
    pub response: Response<Body>,
    /// The redirect chain; the first entry is the original target.
    pub chain: Vec<Url>,
}

impl Resolved {
    /// Number of redirects followed.
    pub fn hops(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }

    /// The URL that produced the final response.
    pub fn final_url(&self) -> Option<&Url> {
        self.chain.last()
    }
}

enum RedirectState {
    Requesting(Url),
    Redirected { status: StatusCode, location: Url },
    Done(Response<Body>),
    Exhausted,
}

/// Follows redirects for one exchange over a borrowed transport.
pub struct RedirectFollower<'a> {
    transport: &'a dyn Transport,
    policy: &'a RedirectConfig,
}

impl<'a> RedirectFollower<'a> {
    pub fn new(transport: &'a dyn Transport, policy: &'a RedirectConfig) -> Self {
        Self { transport, policy }
    }

    /// Send `request`, following redirects up to `max_hops`.
    pub async fn resolve(&self, request: ProxyRequest) -> Result<Resolved, ProxyError> {
        let ProxyRequest {
            mut method,
            url,
            headers,
            mut body,
        } = request;

        let mut chain: Vec<Url> = Vec::with_capacity(self.policy.max_hops + 1);
        let mut state = RedirectState::Requesting(url);

        let response = loop {
            state = match state {
                RedirectState::Requesting(url) => {
                    chain.push(url.clone());
                    let response = self.send(&method, &url, &headers, body.take()).await?;
                    self.classify(&url, response, chain.len() - 1)
                }
                RedirectState::Redirected { status, location } => {
                    tracing::debug!(status = %status, location = %location, "Following upstream redirect");
                    if status == StatusCode::SEE_OTHER && method != Method::HEAD {
                        method = Method::GET;
                    }
                    RedirectState::Requesting(location)
                }
                RedirectState::Done(response) => break response,
                RedirectState::Exhausted => {
                    tracing::warn!(hops = self.policy.max_hops, chain = ?chain_display(&chain), "Redirect limit reached");
                    return Err(ProxyError::RedirectExhausted {
                        hops: self.policy.max_hops,
                    });
                }
            };
        };

        let mut resolved = Resolved { response, chain };
        if self.policy.retry_trailing_slash {
            self.retry_with_trailing_slash(&method, &headers, &mut resolved).await;
        }
        Ok(resolved)
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let request = ProxyRequest {
            method: method.clone(),
            url: url.clone(),
            headers: headers.clone(),
            body,
        };

        self.transport.send(request).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Upstream request failed");
            ProxyError::UpstreamUnreachable(e.to_string())
        })
    }

    fn classify(&self, current: &Url, response: Response<Body>, followed: usize) -> RedirectState {
        let status = response.status();
        if !status.is_redirection() {
            return RedirectState::Done(response);
        }

        let Some(location) = response.headers().get(header::LOCATION) else {
            tracing::debug!(status = %status, url = %current, "Redirect without Location passed through");
            return RedirectState::Done(response);
        };

        let resolved = location
            .to_str()
            .ok()
            .and_then(|raw| current.join(raw.trim()).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"));

        match resolved {
            None => {
                tracing::warn!(status = %status, location = ?location, "Unusable redirect Location passed through");
                RedirectState::Done(response)
            }
            Some(_) if followed >= self.policy.max_hops => RedirectState::Exhausted,
            Some(location) => RedirectState::Redirected { status, location },
        }
    }

    /// One extra request with `/` appended when the final answer was 404.
    ///
    /// The retry replaces the 404 only if it is not a 404 itself; a failed
    /// retry keeps the original response.
    async fn retry_with_trailing_slash(&self, method: &Method, headers: &HeaderMap, resolved: &mut Resolved) {
        if resolved.response.status() != StatusCode::NOT_FOUND {
            return;
        }

        let Some(final_url) = resolved.final_url() else {
            return;
        };
        if final_url.path().ends_with('/') {
            return;
        }

        let mut retry_url = final_url.clone();
        retry_url.set_path(&format!("{}/", final_url.path()));

        match self.send(method, &retry_url, headers, None).await {
            Ok(response) if response.status() != StatusCode::NOT_FOUND => {
                tracing::debug!(url = %retry_url, status = %response.status(), "Trailing-slash retry succeeded");
                resolved.response = response;
                resolved.chain.push(retry_url);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(url = %retry_url, error = %e, "Trailing-slash retry failed; keeping 404");
            }
        }
    }
}

fn chain_display(chain: &[Url]) -> Vec<&str> {
    chain.iter().map(Url::as_str).collect()
}
