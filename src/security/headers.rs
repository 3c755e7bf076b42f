//! Header manipulation and CORS headers.
//!
//! # Responsibilities
//! - Define the CORS headers stamped on every response
//! - Select the request headers forwarded upstream (allowlist)
//! - Strip hop-by-hop headers from relayed responses
//!
//! # Design Decisions
//! - Tiles are public: cookies, authorization and origin headers never
//!   leave the proxy
//! - Conditional-caching headers are forwarded so 304s work end to end

use axum::http::header::{
    HeaderMap, HeaderName, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING,
    UPGRADE, USER_AGENT,
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, Accept";
/// Preflight cache lifetime in seconds.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Request headers copied to the upstream request.
pub const FORWARDED_REQUEST_HEADERS: &[HeaderName] = &[
    ACCEPT,
    ACCEPT_LANGUAGE,
    USER_AGENT,
    IF_NONE_MATCH,
    IF_MODIFIED_SINCE,
    CACHE_CONTROL,
];

/// Connection-scoped headers that must not be relayed.
pub const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    CONNECTION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
];

/// Copy the allowlisted headers from an inbound request.
pub fn forwarded_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS {
        for value in incoming.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP_HEADERS.iter().chain(listed.iter()) {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST};
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_headers_allowlist() {
        let mut incoming = HeaderMap::new();
        incoming.insert(ACCEPT, HeaderValue::from_static("image/png"));
        incoming.insert(IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
        incoming.insert(COOKIE, HeaderValue::from_static("session=1"));
        incoming.insert(AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        incoming.insert(HOST, HeaderValue::from_static("localhost:3001"));

        let forwarded = forwarded_request_headers(&incoming);
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[ACCEPT], "image/png");
        assert_eq!(forwarded[IF_NONE_MATCH], "\"abc\"");
        assert!(forwarded.get(COOKIE).is_none());
        assert!(forwarded.get(AUTHORIZATION).is_none());
        assert!(forwarded.get(HOST).is_none());
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[CONTENT_LENGTH], "42");
    }
}
