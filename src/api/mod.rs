//! HTTP API.
//!
//! Thin transport layer over the document pipeline: validates uploads,
//! runs `DocumentProcessor` on the blocking pool and maps pipeline errors to
//! status codes. The pipeline itself never sees HTTP.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{api_router, cors_layer};
pub use server::{serve, serve_with_shutdown};
pub use types::ApiContext;
