//! HTTP API layer for potluck.
//!
//! - **Endpoints**: group lifecycle, group posts, health
//! - **Extractors**: caller identity and lenient JSON bodies
//! - **Middleware**: shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
