//! Route table lookup.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Classify a request path against it (first match wins)
//! - Describe the table for `/proxy-status`
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Order: local endpoints, numbered hosts, aliases, tile shorthand.
//!   `/t3/vec_c/...` therefore targets host 3, not the shorthand default.
//! - Explicit no-match rather than silent default

use serde::Serialize;

use crate::config::{HostPolicy, UpstreamConfig};
use crate::routing::matcher::{
    AliasPrefixMatcher, ExactPathMatcher, LocalEndpoint, Matcher, NumberedHostMatcher,
    RouteMatch, TileServiceMatcher,
};

pub const HEALTH_PATH: &str = "/health";
pub const PROXY_STATUS_PATH: &str = "/proxy-status";
pub const VERSION_PATH: &str = "/api/version";
pub const ALIAS_PREFIXES: [&str; 2] = ["/api/tianditu/", "/tianditu/"];

/// One row of the route table.
#[derive(Debug)]
struct RouteEntry {
    name: &'static str,
    pattern: String,
    target: String,
    matcher: Box<dyn Matcher>,
}

/// A route as reported by `/proxy-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescription {
    pub name: &'static str,
    pub path: String,
    pub target: String,
}

/// The path classifier.
#[derive(Debug)]
pub struct Router {
    routes: Vec<RouteEntry>,
}

impl Router {
    /// Build the route table for an upstream configuration.
    pub fn from_config(upstream: &UpstreamConfig) -> Self {
        let origin = |host: &str| match upstream.port {
            Some(port) => format!("{}://{}:{}", upstream.scheme, host, port),
            None => format!("{}://{}", upstream.scheme, host),
        };
        let last = upstream.host_count.saturating_sub(1);
        let all_hosts = origin(&format!("t0-t{}.{}", last, upstream.domain));
        let host0 = origin(&upstream.host_name(0));
        let alias_target = match upstream.alias_host_policy {
            HostPolicy::Fixed => host0.clone(),
            policy => format!("{} ({})", all_hosts, policy.as_str()),
        };

        let local = |name, path: &'static str, endpoint| RouteEntry {
            name,
            pattern: path.to_string(),
            target: "local".to_string(),
            matcher: Box::new(ExactPathMatcher::new(path, endpoint)),
        };

        let routes = vec![
            local("health", HEALTH_PATH, LocalEndpoint::Health),
            local("proxy_status", PROXY_STATUS_PATH, LocalEndpoint::ProxyStatus),
            local("version", VERSION_PATH, LocalEndpoint::Version),
            RouteEntry {
                name: "numbered_host",
                pattern: format!("/t0-t{}/*", last),
                target: all_hosts,
                matcher: Box::new(NumberedHostMatcher::new(upstream.host_count)),
            },
            RouteEntry {
                name: "alias",
                pattern: ALIAS_PREFIXES
                    .iter()
                    .map(|p| format!("{}*", p))
                    .collect::<Vec<_>>()
                    .join(", "),
                target: alias_target,
                matcher: Box::new(AliasPrefixMatcher::new(ALIAS_PREFIXES.to_vec())),
            },
            RouteEntry {
                name: "tile_service",
                pattern: "/*{vec,cva,img,cia,ter,cta}_{c,w}*".to_string(),
                target: host0,
                matcher: Box::new(TileServiceMatcher),
            },
        ];

        Self { routes }
    }

    /// Classify a request path. Pure: no I/O, same input same answer.
    pub fn classify(&self, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| route.matcher.matches(path))
    }

    /// Describe the route table in evaluation order.
    pub fn describe(&self) -> Vec<RouteDescription> {
        self.routes
            .iter()
            .map(|route| RouteDescription {
                name: route.name,
                path: route.pattern.clone(),
                target: route.target.clone(),
            })
            .collect()
    }
}
