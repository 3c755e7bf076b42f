//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Token shipped for local development only. Deployments override it.
pub const DEV_TOKEN: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the tile proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Upstream tile provider settings.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Identity reported by the local endpoints.
    pub service: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Maximum requests processed concurrently (backpressure).
    pub max_in_flight: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            max_in_flight: 1024,
        }
    }
}

/// How the alias routes (`/tianditu/*`) pick an upstream host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostPolicy {
    /// Always host `t0`.
    #[default]
    Fixed,
    /// Uniformly random host per request.
    Random,
    /// Rotate through the hosts.
    RoundRobin,
}

impl HostPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostPolicy::Fixed => "fixed",
            HostPolicy::Random => "random",
            HostPolicy::RoundRobin => "round_robin",
        }
    }
}

/// Upstream tile provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL scheme used to reach the provider ("https" or "http").
    pub scheme: String,

    /// Provider domain; hosts are `t{N}.{domain}`.
    pub domain: String,

    /// Explicit port, if the provider is not on the scheme's default port.
    pub port: Option<u16>,

    /// Number of numbered hosts (`t0` .. `t{host_count - 1}`).
    pub host_count: u8,

    /// Access token injected when the caller omits it.
    pub token: String,

    /// Query parameter carrying the access token.
    pub token_param: String,

    /// Host selection for alias routes.
    pub alias_host_policy: HostPolicy,

    /// Static DNS overrides: host name -> socket address.
    pub resolve: BTreeMap<String, String>,

    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` for upstream calls.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            domain: "tianditu.gov.cn".to_string(),
            port: None,
            host_count: 8,
            token: DEV_TOKEN.to_string(),
            token_param: "tk".to_string(),
            alias_host_policy: HostPolicy::Fixed,
            resolve: BTreeMap::new(),
            use_system_proxy: true,
        }
    }
}

impl UpstreamConfig {
    /// Host name of the numbered upstream host.
    pub fn host_name(&self, index: u8) -> String {
        format!("t{}.{}", index, self.domain)
    }

    /// True while the shipped development token is still configured.
    pub fn uses_dev_token(&self) -> bool {
        self.token == DEV_TOKEN
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for the upstream request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 60,
            request_secs: 60,
        }
    }
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Machine-readable id, reported by `/health`.
    pub id: String,

    /// Human-readable name, reported by `/api/version`.
    pub name: String,

    pub api_version: String,

    pub description: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id: "tianditu-gis-proxy".to_string(),
            name: "Tianditu GIS Service".to_string(),
            api_version: "v1".to_string(),
            description: "Tianditu tile proxy and geographic information services".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
