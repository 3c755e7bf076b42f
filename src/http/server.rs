//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (CORS, request ID, tracing, concurrency limit)
//! - Dispatch requests to the route table
//! - Answer local endpoints, forward everything else upstream
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue, Method, Request,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::health;
use crate::http::forward::Forwarder;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{RouteMatch, Router as ProxyRouter, TargetResolver, UpstreamRoute};
use crate::security::headers::{ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub router: Arc<ProxyRouter>,
    pub resolver: Arc<TargetResolver>,
    pub forwarder: Forwarder,
}

impl AppState {
    /// Build the shared per-process state from configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let forwarder = Forwarder::new(&config.upstream, &config.timeouts)?;
        Ok(Self {
            router: Arc::new(ProxyRouter::from_config(&config.upstream)),
            resolver: Arc::new(TargetResolver::from_config(&config.upstream)),
            forwarder,
            config: Arc::new(config),
        })
    }
}

/// A failed upstream attempt.
#[derive(Debug)]
struct ForwardFailure {
    /// Redacted target URL, when resolution got that far.
    target: Option<String>,
    error: ProxyError,
}

/// HTTP server for the tile proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState::new(config)?;
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(ALLOW_ORIGIN),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_in_flight))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The assembled application, for in-process use.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.domain,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Classifies the path, then answers locally or relays upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if method == Method::OPTIONS {
        tracing::debug!(request_id = %request_id, path = %path, "Preflight");
        metrics::record_request(method.as_str(), 200, "preflight", start_time);
        return response::preflight();
    }

    let route = match state.router.classify(&path) {
        Some(RouteMatch::Local(endpoint)) => {
            metrics::record_request(method.as_str(), 200, "local", start_time);
            return health::respond(endpoint, &state.config, &state.router);
        }
        Some(RouteMatch::Upstream(route)) => route,
        None => {
            tracing::debug!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return response::not_found();
        }
    };

    match forward(&state, &route, request).await {
        Ok((response, target)) => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = route.label(),
                service = route.tile_service().unwrap_or("-"),
                target = %target,
                status = response.status().as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Proxied request"
            );
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                route.label(),
                start_time,
            );
            response
        }
        Err(failure) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                route = route.label(),
                service = route.tile_service().unwrap_or("-"),
                target = failure.target.as_deref().unwrap_or("-"),
                status = 500u16,
                error = %failure.error,
                "Proxy request failed"
            );
            metrics::record_upstream_error(route.label());
            metrics::record_request(method.as_str(), 500, route.label(), start_time);
            failure.error.into_response()
        }
    }
}

/// Resolve, forward and normalize one upstream request.
/// Returns the response and the redacted target URL for logging.
async fn forward(
    state: &AppState,
    route: &UpstreamRoute,
    request: Request<Body>,
) -> Result<(Response, String), ForwardFailure> {
    let target = state
        .resolver
        .resolve(route, request.uri().query())
        .map_err(|error| ForwardFailure { target: None, error })?;
    let redacted = target.redacted(state.resolver.token_param());

    let (parts, body) = request.into_parts();
    match state
        .forwarder
        .forward(parts.method, &target, &parts.headers, body)
        .await
    {
        Ok(mut response) => {
            response::normalize(&mut response, &target);
            Ok((response, redacted))
        }
        Err(error) => Err(ForwardFailure {
            target: Some(redacted),
            error,
        }),
    }
}
