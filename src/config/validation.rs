//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and addresses.
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Hosts `t0` through `t7` exist upstream.
pub const MAX_UPSTREAM_HOSTS: u8 = 8;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.max_in_flight must be greater than zero")]
    MaxInFlight,

    #[error("upstream.scheme '{0}' must be 'http' or 'https'")]
    Scheme(String),

    #[error("upstream.domain must not be empty")]
    EmptyDomain,

    #[error("upstream.token must not be empty")]
    EmptyToken,

    #[error("upstream.token_param must not be empty")]
    EmptyTokenParam,

    #[error("upstream.host_count {0} must be between 1 and {max}", max = MAX_UPSTREAM_HOSTS)]
    HostCount(u8),

    #[error("upstream.resolve entry '{host}' -> '{addr}' is not a socket address")]
    ResolveAddress { host: String, addr: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::MaxInFlight);
    }

    let upstream = &config.upstream;
    if upstream.scheme != "http" && upstream.scheme != "https" {
        errors.push(ValidationError::Scheme(upstream.scheme.clone()));
    }
    if upstream.domain.trim().is_empty() {
        errors.push(ValidationError::EmptyDomain);
    }
    if upstream.token.is_empty() {
        errors.push(ValidationError::EmptyToken);
    }
    if upstream.token_param.is_empty() {
        errors.push(ValidationError::EmptyTokenParam);
    }
    if upstream.host_count == 0 || upstream.host_count > MAX_UPSTREAM_HOSTS {
        errors.push(ValidationError::HostCount(upstream.host_count));
    }
    for (host, addr) in &upstream.resolve {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::ResolveAddress {
                host: host.clone(),
                addr: addr.clone(),
            });
        }
    }

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
