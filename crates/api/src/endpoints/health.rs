//! Health endpoint.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::middleware::AppState;

/// Liveness report. Always 200; database reachability is reported, not enforced.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_connected: bool,
    pub timestamp: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = match state.group_store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthResponse {
        status: "OK",
        database_connected,
        timestamp: Utc::now(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
