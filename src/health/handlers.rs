use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::ProxyConfig;
use crate::routing::{LocalEndpoint, RouteDescription, Router};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct UpstreamSummary {
    pub scheme: String,
    pub domain: String,
    pub host_count: u8,
    pub alias_host_policy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProxyStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: String,
    pub upstream: UpstreamSummary,
    pub routes: Vec<RouteDescription>,
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: &'static str,
    pub api_version: String,
    pub description: String,
}

/// Current time as an ISO 8601 / RFC 3339 UTC string.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn health(config: &ProxyConfig) -> HealthStatus {
    HealthStatus {
        status: "ok",
        timestamp: timestamp(),
        service: config.service.id.clone(),
    }
}

pub fn proxy_status(config: &ProxyConfig, router: &Router) -> ProxyStatus {
    ProxyStatus {
        status: "running",
        timestamp: timestamp(),
        service: config.service.id.clone(),
        upstream: UpstreamSummary {
            scheme: config.upstream.scheme.clone(),
            domain: config.upstream.domain.clone(),
            host_count: config.upstream.host_count,
            alias_host_policy: config.upstream.alias_host_policy.as_str(),
        },
        routes: router.describe(),
    }
}

pub fn version(config: &ProxyConfig) -> VersionInfo {
    VersionInfo {
        name: config.service.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        api_version: config.service.api_version.clone(),
        description: config.service.description.clone(),
    }
}

/// Answer a local endpoint with status 200 and a JSON body.
pub fn respond(endpoint: LocalEndpoint, config: &ProxyConfig, router: &Router) -> Response {
    match endpoint {
        LocalEndpoint::Health => Json(health(config)).into_response(),
        LocalEndpoint::ProxyStatus => Json(proxy_status(config, router)).into_response(),
        LocalEndpoint::Version => Json(version(config)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use chrono::DateTime;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let ts = timestamp();
        assert!(ts.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[tokio::test]
    async fn test_health_payload() {
        let config = ProxyConfig::default();
        let router = Router::from_config(&config.upstream);
        let response = respond(LocalEndpoint::Health, &config, &router);
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "tianditu-gis-proxy");
        assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_proxy_status_lists_routes() {
        let config = ProxyConfig::default();
        let router = Router::from_config(&config.upstream);
        let json = body_json(respond(LocalEndpoint::ProxyStatus, &config, &router)).await;

        assert_eq!(json["status"], "running");
        assert_eq!(json["upstream"]["alias_host_policy"], "fixed");
        let routes = json["routes"].as_array().unwrap();
        assert_eq!(routes.len(), 6);
        assert!(routes
            .iter()
            .any(|r| r["path"] == "/t0-t7/*" && r["target"] == "https://t0-t7.tianditu.gov.cn"));
    }

    #[tokio::test]
    async fn test_version_payload() {
        let config = ProxyConfig::default();
        let router = Router::from_config(&config.upstream);
        let json = body_json(respond(LocalEndpoint::Version, &config, &router)).await;

        assert_eq!(json["name"], "Tianditu GIS Service");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["api_version"], "v1");
        assert!(json["description"].is_string());
    }
}
