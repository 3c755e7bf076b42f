//! Configuration loading from disk and the environment.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listen port override.
pub const ENV_PORT: &str = "PORT";
/// Access token override.
pub const ENV_TOKEN: &str = "TIANDITU_API_KEY";
/// Provider domain override.
pub const ENV_DOMAIN: &str = "TIANDITU_DOMAIN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {reason}")]
    Env { name: &'static str, reason: String },

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

/// Load a configuration from a TOML file. Not yet validated.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            name: ENV_PORT,
            reason: format!("'{}' is not a port number", port),
        })?;
        set_port(config, port);
    }
    if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
        config.upstream.token = token;
    }
    if let Some(domain) = lookup(ENV_DOMAIN).filter(|d| !d.is_empty()) {
        config.upstream.domain = domain;
    }
    Ok(())
}

/// Replace the port of the listener bind address, keeping its host.
pub fn set_port(config: &mut ProxyConfig, port: u16) {
    let ip = config
        .listener
        .bind_address
        .parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    config.listener.bind_address = SocketAddr::new(ip, port).to_string();
}

/// Validate, turning the error list into a `ConfigError`.
pub fn finalize(config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
