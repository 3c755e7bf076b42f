//! Forwarding / relay engine.
//!
//! # Responsibilities
//! - Send the request to the resolved upstream URL
//! - Enforce connect and total timeouts
//! - Relay status, headers and a streamed body
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (internal connection pool), no other
//!   state shared between requests
//! - Redirects are relayed, not followed
//! - Dropping the returned future (client went away) aborts the upstream call
//! - Once headers are relayed, a body failure can only be logged and the
//!   stream cut; no second response is ever written

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method},
    response::Response,
};
use futures_util::TryStreamExt;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::ProxyError;
use crate::routing::UpstreamTarget;
use crate::security::headers::forwarded_request_headers;

/// Largest request body forwarded for non-GET methods.
pub const MAX_FORWARDED_BODY: usize = 2 * 1024 * 1024;

/// Relays requests to the upstream tile servers.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build the upstream client from configuration.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .redirect(reqwest::redirect::Policy::none());

        if !upstream.use_system_proxy {
            builder = builder.no_proxy();
        }

        for (host, addr) in &upstream.resolve {
            match addr.parse::<SocketAddr>() {
                Ok(addr) => builder = builder.resolve(host, addr),
                Err(e) => {
                    tracing::warn!(host = %host, addr = %addr, error = %e, "Ignoring invalid resolve override");
                }
            }
        }

        let client = builder.build().map_err(ProxyError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Forward one request and relay the upstream response.
    ///
    /// Upstream 4xx/5xx are returned as `Ok`; only proxy-local failures
    /// (DNS, connect, timeout) are errors.
    pub async fn forward(
        &self,
        method: Method,
        target: &UpstreamTarget,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<Response, ProxyError> {
        let mut request = self
            .client
            .request(method.clone(), target.url.clone())
            .headers(forwarded_request_headers(headers));

        if carries_body(&method) {
            let bytes = to_bytes(body, MAX_FORWARDED_BODY)
                .await
                .map_err(|e| ProxyError::RequestBody(e.to_string()))?;
            request = request.body(bytes);
        }

        let upstream = request.send().await?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let stream = upstream.bytes_stream().inspect_err(|e| {
            tracing::error!(error = %e, "Upstream body failed after response headers were sent");
        });

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// GET, HEAD and OPTIONS never carry a body upstream.
fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}
