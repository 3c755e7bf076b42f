//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, request ID, concurrency limit)
//!     → request.rs (request ID for log correlation)
//!     → [routing layer classifies the path]
//!     → forward.rs (upstream call, streamed relay)
//!     → response.rs (tile headers, hop-by-hop stripping)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
