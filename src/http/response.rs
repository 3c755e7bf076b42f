//! Response normalization.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from relayed responses
//! - Force tile headers (`image/png`, one-day cache) on tile paths
//! - Build the locally answered responses (preflight, 404)
//!
//! CORS headers are not set here; the server layers stamp them on every
//! response, including errors.

use axum::{
    body::Body,
    http::{
        header::{ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::error::{json_error, NOT_FOUND_MESSAGE};
use crate::routing::UpstreamTarget;
use crate::security::headers::{strip_hop_by_hop, PREFLIGHT_MAX_AGE};

pub const TILE_CONTENT_TYPE: &str = "image/png";
pub const TILE_CACHE_CONTROL: &str = "public, max-age=86400";

/// Normalize a relayed upstream response in place.
///
/// The upstream sometimes omits or mis-declares the content type of tile
/// bytes, so tile responses always get `image/png`.
pub fn normalize(response: &mut Response, target: &UpstreamTarget) {
    let headers = response.headers_mut();
    strip_hop_by_hop(headers);
    if target.tile {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TILE_CONTENT_TYPE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(TILE_CACHE_CONTROL));
    }
}

/// CORS preflight answer: 200 with an empty body.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    response.headers_mut().insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    response
}

/// Answer for paths no route claims.
pub fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}
