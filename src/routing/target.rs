//! Upstream target resolution.
//!
//! Turns a classified route into an absolute upstream URL:
//! host selection, prefix-stripped path, original query, and the access
//! token when the caller did not send one. Pure string construction; the
//! only non-determinism is the alias host selector.

use std::fmt::Write as _;

use url::{form_urlencoded, Url};

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::load_balancer::{self, LoadBalancer};
use crate::routing::matcher::{is_tile_path, UpstreamRoute};

/// Host used by tile shorthand routes.
pub const DEFAULT_HOST: u8 = 0;

/// A fully resolved upstream request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Index of the numbered host (`t{host_index}`).
    pub host_index: u8,
    /// Absolute URL to request.
    pub url: Url,
    /// Whether the response gets tile headers.
    pub tile: bool,
}

impl UpstreamTarget {
    /// URL with the value of `param` masked, for logging.
    pub fn redacted(&self, param: &str) -> String {
        if !self.url.query_pairs().any(|(k, _)| k == param) {
            return self.url.to_string();
        }
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == param { "***".into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

/// Builds upstream URLs from routes.
#[derive(Debug)]
pub struct TargetResolver {
    scheme: String,
    domain: String,
    port: Option<u16>,
    host_count: u8,
    token: String,
    token_param: String,
    alias_hosts: Box<dyn LoadBalancer>,
}

impl TargetResolver {
    /// Create a resolver using the configured alias host policy.
    pub fn from_config(upstream: &UpstreamConfig) -> Self {
        Self::with_selector(upstream, load_balancer::from_policy(upstream.alias_host_policy))
    }

    /// Create a resolver with an explicit alias host selector.
    pub fn with_selector(upstream: &UpstreamConfig, alias_hosts: Box<dyn LoadBalancer>) -> Self {
        Self {
            scheme: upstream.scheme.clone(),
            domain: upstream.domain.clone(),
            port: upstream.port,
            host_count: upstream.host_count.max(1),
            token: upstream.token.clone(),
            token_param: upstream.token_param.clone(),
            alias_hosts,
        }
    }

    /// Query parameter carrying the access token.
    pub fn token_param(&self) -> &str {
        &self.token_param
    }

    /// Resolve a route and the inbound query string into a target.
    ///
    /// Numbered-host routes forward the query verbatim. Alias and tile
    /// shorthand routes get the access token appended when absent.
    pub fn resolve(
        &self,
        route: &UpstreamRoute,
        query: Option<&str>,
    ) -> Result<UpstreamTarget, ProxyError> {
        let (host_index, inject_token) = match route {
            UpstreamRoute::NumberedHost { index, .. } => (*index, false),
            UpstreamRoute::Alias { .. } => (self.alias_hosts.next_host(self.host_count), true),
            UpstreamRoute::TileService { .. } => (DEFAULT_HOST, true),
        };
        self.build(host_index, route.path(), query, inject_token)
    }

    /// Build a target for an explicit host, path and query.
    pub fn build(
        &self,
        host_index: u8,
        path: &str,
        query: Option<&str>,
        inject_token: bool,
    ) -> Result<UpstreamTarget, ProxyError> {
        let mut raw = format!("{}://t{}.{}", self.scheme, host_index, self.domain);
        if let Some(port) = self.port {
            let _ = write!(raw, ":{}", port);
        }
        raw.push_str(path);

        let mut query = query.unwrap_or_default().to_string();
        if inject_token && !has_param(&query, &self.token_param) {
            if !query.is_empty() {
                query.push('&');
            }
            query.extend(form_urlencoded::byte_serialize(self.token_param.as_bytes()));
            query.push('=');
            query.extend(form_urlencoded::byte_serialize(self.token.as_bytes()));
        }
        if !query.is_empty() {
            raw.push('?');
            raw.push_str(&query);
        }

        let url = Url::parse(&raw).map_err(|e| ProxyError::InvalidTarget {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(UpstreamTarget {
            host_index,
            tile: is_tile_path(url.path()),
            url,
        })
    }
}

/// True if the query string carries `param` (with or without a value).
pub fn has_param(query: &str, param: &str) -> bool {
    form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::{FixedHost, RoundRobin};

    fn upstream() -> UpstreamConfig {
        UpstreamConfig {
            token: "secret".into(),
            ..UpstreamConfig::default()
        }
    }

    fn token_count(target: &UpstreamTarget) -> usize {
        target.url.query_pairs().filter(|(k, _)| k == "tk").count()
    }

    #[test]
    fn test_numbered_host_keeps_path_and_query() {
        let resolver = TargetResolver::from_config(&upstream());
        let query = "LAYER=vec&TILEMATRIX=5&TILEROW=10&TILECOL=20";

        for index in 0..8u8 {
            let route = UpstreamRoute::NumberedHost {
                index,
                path: "/vec_c/wmts".into(),
            };
            let target = resolver.resolve(&route, Some(query)).unwrap();
            let expected_host = format!("t{}.tianditu.gov.cn", index);
            assert_eq!(target.url.host_str(), Some(expected_host.as_str()));
            assert_eq!(target.url.path(), "/vec_c/wmts");
            assert_eq!(target.url.query(), Some(query));
            assert_eq!(target.host_index, index);
            assert!(target.tile);
        }
    }

    #[test]
    fn test_alias_fixed_host_injects_token_once() {
        let resolver = TargetResolver::from_config(&upstream());
        let route = UpstreamRoute::Alias {
            path: "/DataServer".into(),
        };

        let target = resolver.resolve(&route, Some("T=vec_w&x=1")).unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://t0.tianditu.gov.cn/DataServer?T=vec_w&x=1&tk=secret"
        );
        assert_eq!(token_count(&target), 1);

        let target = resolver.resolve(&route, None).unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://t0.tianditu.gov.cn/DataServer?tk=secret"
        );
        assert_eq!(token_count(&target), 1);
        assert!(!target.tile);
    }

    #[test]
    fn test_caller_token_passes_through() {
        let resolver = TargetResolver::from_config(&upstream());
        let route = UpstreamRoute::Alias {
            path: "/img_w/wmts".into(),
        };
        let target = resolver.resolve(&route, Some("tk=mine&x=1")).unwrap();
        assert_eq!(target.url.query(), Some("tk=mine&x=1"));
        assert_eq!(token_count(&target), 1);
    }

    #[test]
    fn test_tile_shorthand_uses_default_host_and_same_path() {
        let resolver = TargetResolver::from_config(&upstream());
        let route = UpstreamRoute::TileService {
            service: "cva_c",
            path: "/maps/cva_c/wmts".into(),
        };
        let target = resolver.resolve(&route, Some("a=b")).unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://t0.tianditu.gov.cn/maps/cva_c/wmts?a=b&tk=secret"
        );
        assert_eq!(target.host_index, DEFAULT_HOST);
    }

    #[test]
    fn test_alias_selector_is_used() {
        let resolver = TargetResolver::with_selector(&upstream(), Box::new(RoundRobin::new()));
        let route = UpstreamRoute::Alias { path: "/a".into() };
        let hosts: Vec<u8> = (0..9)
            .map(|_| resolver.resolve(&route, None).unwrap().host_index)
            .collect();
        assert_eq!(hosts, vec![0, 1, 2, 3, 4, 5, 6, 7, 0]);

        let fixed = TargetResolver::with_selector(&upstream(), Box::new(FixedHost::new(2)));
        assert_eq!(fixed.resolve(&route, None).unwrap().host_index, 2);
    }

    #[test]
    fn test_port_and_scheme() {
        let config = UpstreamConfig {
            scheme: "http".into(),
            domain: "tiles.test".into(),
            port: Some(8080),
            ..upstream()
        };
        let resolver = TargetResolver::from_config(&config);
        let target = resolver.build(4, "/x", None, false).unwrap();
        assert_eq!(target.url.as_str(), "http://t4.tiles.test:8080/x");
    }

    #[test]
    fn test_token_is_encoded() {
        let config = UpstreamConfig {
            token: "a b&c".into(),
            ..upstream()
        };
        let resolver = TargetResolver::from_config(&config);
        let target = resolver.build(0, "/x", None, true).unwrap();
        assert_eq!(target.url.query(), Some("tk=a+b%26c"));
        let token: Vec<_> = target.url.query_pairs().filter(|(k, _)| k == "tk").collect();
        assert_eq!(token[0].1, "a b&c");
    }

    #[test]
    fn test_has_param() {
        assert!(has_param("tk=1", "tk"));
        assert!(has_param("a=1&tk", "tk"));
        assert!(!has_param("atk=1", "tk"));
        assert!(!has_param("", "tk"));
    }

    #[test]
    fn test_redacted() {
        let resolver = TargetResolver::from_config(&upstream());
        let target = resolver.build(0, "/wmts", Some("x=1"), true).unwrap();
        assert_eq!(
            target.redacted("tk"),
            "https://t0.tianditu.gov.cn/wmts?x=1&tk=***"
        );
        let plain = resolver.build(0, "/wmts", Some("x=1"), false).unwrap();
        assert_eq!(plain.redacted("tk"), "https://t0.tianditu.gov.cn/wmts?x=1");
    }
}
