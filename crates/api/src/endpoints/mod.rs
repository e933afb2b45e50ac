//! API endpoints.

mod group_posts;
mod groups;
mod health;

use axum::{Router, middleware::from_fn};

use crate::middleware::{AppState, caller_span};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest(
            "/groups",
            groups::router().merge(group_posts::router()),
        )
        .layer(from_fn(caller_span))
}
