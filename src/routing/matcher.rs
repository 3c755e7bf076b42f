//! Path matching logic.
//!
//! # Responsibilities
//! - Match exact local endpoint paths
//! - Match numbered host prefixes (`/t0/` .. `/t7/`)
//! - Match alias prefixes (`/tianditu/`, `/api/tianditu/`)
//! - Match paths mentioning a tile-service code (`vec_c`, `img_w`, ...)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matchers are pure: no I/O, no interior state
//! - No regex; the same substring rule decides routing and tile headers

/// The twelve tile-service codes: layer id + `_c` / `_w` tile matrix set.
pub const TILE_SERVICE_CODES: [&str; 12] = [
    "vec_c", "vec_w", "cva_c", "cva_w", "img_c", "img_w", "cia_c", "cia_w", "ter_c", "ter_w",
    "cta_c", "cta_w",
];

/// Endpoints answered by the proxy itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEndpoint {
    Health,
    ProxyStatus,
    Version,
}

/// A request that must be forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRoute {
    /// `/t{index}/<path>`: host fixed by the prefix, prefix stripped.
    NumberedHost { index: u8, path: String },
    /// `/tianditu/<path>`: host chosen by the alias policy, prefix stripped.
    Alias { path: String },
    /// A path mentioning a tile-service code, forwarded verbatim to host 0.
    TileService { service: &'static str, path: String },
}

impl UpstreamRoute {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamRoute::NumberedHost { .. } => "numbered_host",
            UpstreamRoute::Alias { .. } => "alias",
            UpstreamRoute::TileService { .. } => "tile_service",
        }
    }

    /// Path to forward upstream.
    pub fn path(&self) -> &str {
        match self {
            UpstreamRoute::NumberedHost { path, .. }
            | UpstreamRoute::Alias { path }
            | UpstreamRoute::TileService { path, .. } => path,
        }
    }

    /// Tile-service code that selected a shorthand route.
    pub fn tile_service(&self) -> Option<&'static str> {
        match self {
            UpstreamRoute::TileService { service, .. } => Some(*service),
            _ => None,
        }
    }
}

/// Result of classifying a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Local(LocalEndpoint),
    Upstream(UpstreamRoute),
}

/// Trait for classifying request paths.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the classification if the path matches this rule.
    fn matches(&self, path: &str) -> Option<RouteMatch>;
}

/// Matches one exact path and maps it to a local endpoint.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: &'static str,
    endpoint: LocalEndpoint,
}

impl ExactPathMatcher {
    pub fn new(path: &'static str, endpoint: LocalEndpoint) -> Self {
        Self { path, endpoint }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> Option<RouteMatch> {
        (path == self.path).then_some(RouteMatch::Local(self.endpoint))
    }
}

/// Matches `/t{N}/...` for `N < host_count`.
#[derive(Debug, Clone)]
pub struct NumberedHostMatcher {
    host_count: u8,
}

impl NumberedHostMatcher {
    pub fn new(host_count: u8) -> Self {
        Self { host_count }
    }
}

impl Matcher for NumberedHostMatcher {
    fn matches(&self, path: &str) -> Option<RouteMatch> {
        let (digit, rest) = path.strip_prefix("/t")?.split_once('/')?;
        // Single digit only: `/t07/` and `/t10/` are not host prefixes.
        if digit.len() != 1 {
            return None;
        }
        let index: u8 = digit.parse().ok()?;
        if index >= self.host_count {
            return None;
        }
        Some(RouteMatch::Upstream(UpstreamRoute::NumberedHost {
            index,
            path: format!("/{}", rest),
        }))
    }
}

/// Matches any of a set of alias prefixes and strips it.
#[derive(Debug, Clone)]
pub struct AliasPrefixMatcher {
    prefixes: Vec<&'static str>,
}

impl AliasPrefixMatcher {
    /// Prefixes must end with `/`; the slash is kept on the forwarded path.
    pub fn new(prefixes: Vec<&'static str>) -> Self {
        Self { prefixes }
    }
}

impl Matcher for AliasPrefixMatcher {
    fn matches(&self, path: &str) -> Option<RouteMatch> {
        self.prefixes.iter().find_map(|prefix| {
            path.strip_prefix(prefix).map(|rest| {
                RouteMatch::Upstream(UpstreamRoute::Alias {
                    path: format!("/{}", rest),
                })
            })
        })
    }
}

/// Matches paths that mention a tile-service code anywhere.
#[derive(Debug, Clone, Default)]
pub struct TileServiceMatcher;

impl Matcher for TileServiceMatcher {
    fn matches(&self, path: &str) -> Option<RouteMatch> {
        tile_service_code(path).map(|service| {
            RouteMatch::Upstream(UpstreamRoute::TileService {
                service,
                path: path.to_string(),
            })
        })
    }
}

/// The leftmost tile-service code occurring in `path`.
pub fn tile_service_code(path: &str) -> Option<&'static str> {
    TILE_SERVICE_CODES
        .iter()
        .filter_map(|code| path.find(code).map(|at| (at, *code)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, code)| code)
}

/// True if a forwarded path looks like a tile request: it mentions a
/// tile-service code anywhere, or a `/wmts` endpoint.
pub fn is_tile_path(path: &str) -> bool {
    path.contains("/wmts") || tile_service_code(path).is_some()
}
