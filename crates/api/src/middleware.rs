//! API middleware and shared state.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use potluck_core::{GroupPostService, GroupService};
use potluck_db::store::{GroupPostStore, GroupStore, UserDirectory};
use tracing::Instrument;

use crate::extractors::USER_ID_HEADER;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub group_service: GroupService,
    pub group_post_service: GroupPostService,
    /// Used by the health check to probe the database.
    pub group_store: Arc<dyn GroupStore>,
}

impl AppState {
    /// Wire both services over the same stores.
    #[must_use]
    pub fn new(
        groups: Arc<dyn GroupStore>,
        posts: Arc<dyn GroupPostStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            group_service: GroupService::new(groups.clone(), posts.clone(), users.clone()),
            group_post_service: GroupPostService::new(groups.clone(), posts, users),
            group_store: groups,
        }
    }
}

/// Attach the `X-User-Id` header, when present, to the request span.
pub async fn caller_span(req: Request<Body>, next: Next) -> Response {
    let caller = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let span = tracing::debug_span!("caller", user_id = %caller);
    next.run(req).instrument(span).await
}
