//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `upstream.url`.
pub const ENV_UPSTREAM: &str = "MIRROR_PROXY_UPSTREAM";

/// Environment variable overriding the injected cookie credential.
pub const ENV_COOKIE: &str = "MIRROR_PROXY_COOKIE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Apply environment overrides. `lookup` is `std::env::var` in production.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(upstream) = lookup(ENV_UPSTREAM).filter(|v| !v.trim().is_empty()) {
        config.upstream.url = upstream.trim().to_string();
    }
    if let Some(cookie) = lookup(ENV_COOKIE) {
        let cookie = cookie.trim().to_string();
        config
            .cookies
            .set_credential(if cookie.is_empty() { None } else { Some(cookie) });
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse TOML, apply overrides and validate.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: ProxyConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, process_env)
}

/// Defaults plus environment overrides, for running without a file.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    parse_config("", process_env)
}
