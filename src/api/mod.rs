//! API Layer Module
//!
//! HTTP server, routes, error mapping, and token-verification extractor.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

// Re-exports for convenience
pub use error::{ApiError, ApiResult};
pub use middleware::AuthUser;
pub use server::{create_router, start_server, AppState, SharedAppState};
