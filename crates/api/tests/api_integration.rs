//! API integration tests.
//!
//! These tests drive the router end to end over the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use potluck_api::{AppState, router as api_router};
use potluck_db::test_utils::MemoryStore;
use serde_json::{Value, json};
use tower::ServiceExt;

fn create_test_router() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), store.clone(), store.clone());
    (store, api_router().with_state(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("X-User-Id", caller);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_group(app: &Router, body: Value) -> String {
    let (status, group) = send(app, "POST", "/groups", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    group["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let (store, app) = create_test_router();

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["databaseConnected"], true);
    assert!(body["timestamp"].is_string());

    store.set_unavailable(true);
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["databaseConnected"], false);
}

#[tokio::test]
async fn test_store_outage_returns_503() {
    let (store, app) = create_test_router();
    store.set_unavailable(true);

    let (status, body) = send(&app, "GET", "/groups", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Database not available");
}

#[tokio::test]
async fn test_create_group() {
    let (store, app) = create_test_router();
    store.insert_user("alice", "Alice Baker").await;

    let (status, group) = send(
        &app,
        "POST",
        "/groups",
        None,
        Some(json!({
            "name": "Sunday Roasts",
            "description": "Slow food",
            "creatorId": "alice",
            "isPrivate": true,
            "requireApproval": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["name"], "Sunday Roasts");
    assert_eq!(group["creatorName"], "Alice Baker");
    assert_eq!(group["membersCount"], 1);
    assert_eq!(group["postsCount"], 0);
    assert_eq!(group["members"][0]["role"], "admin");
    assert_eq!(group["settings"]["requireApproval"], false);
    assert_eq!(group["settings"]["allowMemberPosts"], true);

    let (status, body) = send(
        &app,
        "POST",
        "/groups",
        None,
        Some(json!({ "creatorId": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Group name is required");
}

#[tokio::test]
async fn test_creator_from_header() {
    let (_, app) = create_test_router();

    let (status, group) = send(
        &app,
        "POST",
        "/groups",
        Some("bob"),
        Some(json!({ "name": "Header Group" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["creatorId"], "bob");
}

#[tokio::test]
async fn test_join_flow() {
    let (_, app) = create_test_router();
    let gid = create_group(
        &app,
        json!({ "name": "Open Kitchen", "creatorId": "a", "requireApproval": false }),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/join"),
        None,
        Some(json!({ "userId": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["message"], "Joined group successfully");

    let (status, body) = send(&app, "POST", &format!("/groups/{gid}/join"), Some("b"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already a member of this group");

    let (status, body) = send(&app, "POST", &format!("/groups/{gid}/join"), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");

    let (status, _) = send(&app, "POST", "/groups/nope/join", Some("b"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_approval_flow() {
    let (_, app) = create_test_router();
    let gid = create_group(&app, json!({ "name": "Gated", "creatorId": "a" })).await;

    let (_, body) = send(&app, "POST", &format!("/groups/{gid}/join"), Some("c"), None).await;
    assert_eq!(body["status"], "pending");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/groups/{gid}/requests/c"),
        None,
        Some(json!({ "action": "approve", "adminId": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin privileges required");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/groups/{gid}/requests/c"),
        None,
        Some(json!({ "action": "approve", "adminId": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "approve");
    assert_eq!(body["message"], "User approved successfully");

    let (_, group) = send(&app, "GET", &format!("/groups/{gid}"), None, None).await;
    assert_eq!(group["membersCount"], 2);
    assert_eq!(group["pendingRequests"], json!([]));
    assert_eq!(group["membersDetails"][1]["userName"], "Unknown User");
}

#[tokio::test]
async fn test_leave_and_delete() {
    let (_, app) = create_test_router();
    let gid = create_group(
        &app,
        json!({ "name": "Temp", "creatorId": "a", "requireApproval": false }),
    )
    .await;
    send(&app, "POST", &format!("/groups/{gid}/join"), Some("b"), None).await;

    let (status, body) = send(&app, "DELETE", &format!("/groups/{gid}/members/a"), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Group creator cannot leave the group");

    let (status, _) = send(&app, "DELETE", &format!("/groups/{gid}/members/b"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/groups/{gid}"),
        None,
        Some(json!({ "userId": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &format!("/groups/{gid}"), Some("a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Group deleted successfully");

    let (status, _) = send(&app, "GET", &format!("/groups/{gid}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_group_posts_are_empty_for_outsiders() {
    let (_, app) = create_test_router();
    let gid = create_group(
        &app,
        json!({ "name": "Secret", "creatorId": "a", "isPrivate": true }),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts"),
        Some("a"),
        Some(json!({ "title": "Family Lasagna" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Group post created successfully");

    let (status, body) = send(&app, "GET", &format!("/groups/{gid}/posts"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &app,
        "GET",
        &format!("/groups/{gid}/posts?userId=a"),
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, groups) = send(&app, "GET", "/groups", None, None).await;
    assert_eq!(groups, json!([]));
}

#[tokio::test]
async fn test_post_lifecycle() {
    let (_, app) = create_test_router();
    let gid = create_group(
        &app,
        json!({ "name": "Bakers", "creatorId": "a", "requireApproval": false }),
    )
    .await;
    send(&app, "POST", &format!("/groups/{gid}/join"), Some("b"), None).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts"),
        None,
        Some(json!({ "userId": "stranger", "title": "Intruder Pie" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only group members can post");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts"),
        Some("b"),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Recipe title is required");

    let (status, post) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts"),
        Some("b"),
        Some(json!({ "title": "Rye Bread", "prepTime": 180, "servings": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["isApproved"], true);
    assert_eq!(post["meatType"], "Mixed");
    let pid = post["id"].as_str().unwrap().to_string();

    let (status, likes) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts/{pid}/like"),
        Some("a"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes["likesCount"], 1);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts/{pid}/like"),
        Some("a"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already liked this post");

    let (status, added) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts/{pid}/comments"),
        Some("a"),
        Some(json!({ "text": "Crusty!", "userName": "Chef A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["comment"]["userName"], "Chef A");
    assert_eq!(added["commentsCount"], 1);
    let cid = added["comment"]["id"].as_str().unwrap().to_string();

    let (status, edited) = send(
        &app,
        "PUT",
        &format!("/groups/{gid}/posts/{pid}"),
        Some("b"),
        Some(json!({ "title": "Dark Rye Bread" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["title"], "Dark Rye Bread");
    assert_eq!(edited["servings"], 8);

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/groups/{gid}/posts/{pid}/comments/{cid}"),
        Some("b"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission denied");

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/groups/{gid}/posts/{pid}/comments/{cid}"),
        Some("a"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commentsCount"], 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/groups/{gid}/posts/{pid}"),
        None,
        Some(json!({ "userId": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/groups/{gid}/posts/{pid}"),
        Some("b"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pending_post_message() {
    let (_, app) = create_test_router();
    let gated = create_group(&app, json!({ "name": "Strict", "creatorId": "a" })).await;
    send(&app, "POST", &format!("/groups/{gated}/join"), Some("b"), None).await;
    send(
        &app,
        "PUT",
        &format!("/groups/{gated}/requests/b"),
        Some("a"),
        Some(json!({ "action": "approve" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{gated}/posts"),
        Some("b"),
        Some(json!({ "title": "Waiting Waffles" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isApproved"], false);
    assert_eq!(body["message"], "Group post created and waiting for approval");

    let (_, listed) = send(&app, "GET", &format!("/groups/{gated}/posts"), Some("b"), None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_search_requires_query() {
    let (_, app) = create_test_router();
    create_group(&app, json!({ "name": "Vegan Bites", "creatorId": "a" })).await;

    let (status, body) = send(&app, "GET", "/groups/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (status, body) = send(&app, "GET", "/groups/search?q=vegan", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_oversized_input_is_a_bad_request() {
    let (_, app) = create_test_router();
    let long_id = "u".repeat(40);

    let (status, _) = send(
        &app,
        "POST",
        "/groups",
        Some(&long_id),
        Some(json!({ "name": "Too Long" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let gid = create_group(
        &app,
        json!({ "name": "Grill Club", "creatorId": "a", "requireApproval": false }),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/groups/{gid}/posts"),
        Some("a"),
        Some(json!({ "title": "Ribs", "meatType": "m".repeat(65) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
