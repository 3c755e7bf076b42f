//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered route table, first match wins)
//!     → matcher.rs (evaluate one rule)
//!     → RouteMatch: Local endpoint | Upstream route | no match
//!
//! Upstream route + query
//!     → target.rs (host selection, prefix strip, token injection)
//!     → UpstreamTarget (absolute URL, tile flag)
//! ```
//!
//! # Design Decisions
//! - Route table built at startup, immutable at runtime
//! - Classification and resolution do no I/O
//! - Deterministic: same path always gets the same classification

pub mod matcher;
pub mod router;
pub mod target;

pub use matcher::{is_tile_path, LocalEndpoint, RouteMatch, UpstreamRoute, TILE_SERVICE_CODES};
pub use router::{RouteDescription, Router};
pub use target::{TargetResolver, UpstreamTarget};
