//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (hops > 0, timeouts > 0, address parses)
//! - Validate header names/values before they reach the request path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::http::cookies::CookiePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.url {url:?} is not a valid URL: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("upstream.url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("upstream.url has no host")]
    MissingUpstreamHost,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("redirects.max_hops must be at least 1")]
    ZeroHops,

    #[error("cookies.max_length must be greater than zero")]
    ZeroCookieLength,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Parse and check the upstream URL.
pub fn parse_upstream(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUpstream {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingUpstreamHost);
    }

    Ok(url)
}

fn check_header(name: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if let Err(e) = HeaderName::try_from(name) {
        errors.push(ValidationError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        });
    }
    if let Err(e) = HeaderValue::from_str(value) {
        errors.push(ValidationError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        });
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_upstream(&config.upstream.url) {
        errors.push(e);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.redirects.max_hops == 0 {
        errors.push(ValidationError::ZeroHops);
    }

    if let CookiePolicy::Merge { max_length: 0, .. } = config.cookies {
        errors.push(ValidationError::ZeroCookieLength);
    }

    if let Some(credential) = config.cookies.credential() {
        check_header("cookie", credential, &mut errors);
    }

    if !config.upstream.user_agent.is_empty() {
        check_header("user-agent", &config.upstream.user_agent, &mut errors);
    }

    for (name, value) in &config.upstream.request_headers {
        check_header(name, value, &mut errors);
    }

    check_header("access-control-allow-headers", &config.cors.allow_headers, &mut errors);
    check_header("access-control-allow-methods", &config.cors.allow_methods, &mut errors);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_upstream_checks() {
        assert!(parse_upstream("https://upstream.example:8443/ignored?x=1").is_ok());
        assert_eq!(
            parse_upstream("ftp://upstream.example"),
            Err(ValidationError::UnsupportedScheme("ftp".into()))
        );
        assert!(matches!(
            parse_upstream("not a url"),
            Err(ValidationError::InvalidUpstream { .. })
        ));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "mailto:ops@example.com".into();
        config.listener.bind_address = "localhost".into();
        config.redirects.max_hops = 0;
        config.cookies = CookiePolicy::Merge {
            credential: Some("bad\nvalue".into()),
            max_length: 0,
            tracking_prefixes: Vec::new(),
        };
        config.timeouts.request_secs = 0;
        config
            .upstream
            .request_headers
            .insert("bad header".into(), "x".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsupportedScheme("mailto".into())));
        assert!(errors.contains(&ValidationError::InvalidBindAddress("localhost".into())));
        assert!(errors.contains(&ValidationError::ZeroHops));
        assert!(errors.contains(&ValidationError::ZeroCookieLength));
        assert!(errors.contains(&ValidationError::ZeroTimeout("request_secs")));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::InvalidHeader { .. }))
                .count(),
            2
        );
    }
}
