//! Group endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use potluck_common::AppResult;
use potluck_core::services::group::{
    CreateGroupInput, GroupDetails, GroupResponse, JoinStatus, RequestAction,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{HeaderCaller, JsonBody},
    middleware::AppState,
    response::{created, message, with_message},
};

// ==================== Request/Response Types ====================

/// Body of requests that only identify the caller.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerBody {
    pub user_id: Option<String>,
}

/// Query of reads that may be personalized.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub include_private: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequestBody {
    #[serde(default)]
    pub action: String,
    pub admin_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub status: &'static str,
    pub group_id: String,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub action: RequestAction,
}

// ==================== Handlers ====================

async fn create(
    caller: HeaderCaller,
    State(state): State<AppState>,
    JsonBody(mut input): JsonBody<CreateGroupInput>,
) -> AppResult<impl IntoResponse> {
    input.creator_id = caller.or_explicit(input.creator_id.take());
    let group = state.group_service.create_group(input).await?;

    Ok(created(Json(group)))
}

async fn list(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Query(query): Query<CallerQuery>,
) -> AppResult<Json<Vec<GroupResponse>>> {
    let caller = caller.or_explicit(query.user_id);
    let groups = state.group_service.list_groups(caller.as_deref()).await?;

    Ok(Json(groups))
}

async fn search(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<GroupResponse>>> {
    let caller = caller.or_explicit(query.user_id);
    let groups = state
        .group_service
        .search_groups(query.q.as_deref(), caller.as_deref(), query.include_private)
        .await?;

    Ok(Json(groups))
}

async fn show(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> AppResult<Json<GroupDetails>> {
    let group = state.group_service.get_group(&group_id).await?;

    Ok(Json(group))
}

async fn join(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let status = state
        .group_service
        .request_join(&group_id, caller.as_deref())
        .await?;

    let (text, status) = match status {
        JoinStatus::Pending => ("Join request sent successfully", "pending"),
        JoinStatus::Approved => ("Joined group successfully", "approved"),
    };

    Ok(with_message(
        text,
        JoinResponse {
            status,
            group_id,
            user_id: caller,
        },
    ))
}

async fn cancel_join(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    state
        .group_service
        .cancel_join_request(&group_id, caller.as_deref())
        .await?;

    Ok(with_message(
        "Join request canceled successfully",
        JoinResponse {
            status: "canceled",
            group_id,
            user_id: caller,
        },
    ))
}

async fn decide_request(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<DecideRequestBody>,
) -> AppResult<impl IntoResponse> {
    let admin = caller.or_explicit(body.admin_id);
    let action = state
        .group_service
        .decide_request(&group_id, &user_id, &body.action, admin.as_deref())
        .await?;

    let text = match action {
        RequestAction::Approve => "User approved successfully",
        RequestAction::Reject => "User rejected successfully",
    };

    Ok(with_message(text, DecisionResponse { action }))
}

async fn leave(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    state.group_service.leave_group(&group_id, &user_id).await?;

    Ok(message("Left group successfully"))
}

async fn delete_group(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    state
        .group_service
        .delete_group(&group_id, caller.as_deref())
        .await?;

    Ok(message("Group deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/search", get(search))
        .route("/{id}", get(show).delete(delete_group))
        .route("/{id}/join", post(join).delete(cancel_join))
        .route("/{id}/requests/{user_id}", put(decide_request))
        .route("/{id}/members/{user_id}", delete(leave))
}
