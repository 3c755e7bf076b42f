//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (allowlist: only cache/content-negotiation headers go upstream)
//!
//! Upstream response headers
//!     → headers.rs (strip hop-by-hop)
//!     → CORS headers stamped by the server layers
//! ```

pub mod headers;
