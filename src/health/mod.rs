//! Local service endpoints.
//!
//! # Endpoints
//! - `/health`: liveness with service id and timestamp
//! - `/proxy-status`: running state and the route table
//! - `/api/version`: name, version and API version
//!
//! # Design Decisions
//! - Answered in-process, never forwarded
//! - Timestamps are RFC 3339 UTC with milliseconds

pub mod handlers;

pub use handlers::respond;
