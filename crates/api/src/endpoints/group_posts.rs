//! Group post endpoints: recipes, likes and comments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use potluck_common::AppResult;
use potluck_core::services::group_post::{CommentInput, EnrichedPost, PostContentInput};
use serde::{Deserialize, Serialize};

use super::groups::{CallerBody, CallerQuery};
use crate::{
    extractors::{HeaderCaller, JsonBody},
    middleware::AppState,
    response::{created, message, with_message},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub content: PostContentInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub comment: CommentInput,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponse<T: Serialize> {
    pub comments_count: usize,
    pub comments: Vec<T>,
}

async fn list(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<CallerQuery>,
) -> AppResult<Json<Vec<EnrichedPost>>> {
    let caller = caller.or_explicit(query.user_id);
    let posts = state
        .group_post_service
        .list_group_posts(&group_id, caller.as_deref())
        .await?;

    Ok(Json(posts))
}

async fn show(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    Query(query): Query<CallerQuery>,
) -> AppResult<Json<EnrichedPost>> {
    let caller = caller.or_explicit(query.user_id);
    let post = state
        .group_post_service
        .get_group_post(&group_id, &post_id, caller.as_deref())
        .await?;

    Ok(Json(post))
}

async fn create(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    JsonBody(body): JsonBody<PostBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let post = state
        .group_post_service
        .create_group_post(&group_id, caller.as_deref(), body.content)
        .await?;

    let text = if post.is_approved {
        "Group post created successfully"
    } else {
        "Group post created and waiting for approval"
    };

    Ok(created(with_message(text, post)))
}

async fn update(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<PostBody>,
) -> AppResult<Json<EnrichedPost>> {
    let caller = caller.or_explicit(body.user_id);
    let post = state
        .group_post_service
        .edit_group_post(&group_id, &post_id, caller.as_deref(), body.content)
        .await?;

    Ok(Json(post))
}

async fn remove(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    state
        .group_post_service
        .delete_group_post(&group_id, &post_id, caller.as_deref())
        .await?;

    Ok(message("Group post deleted successfully"))
}

async fn like(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let likes = state
        .group_post_service
        .like_post(&group_id, &post_id, caller.as_deref())
        .await?;

    Ok(with_message("Post liked successfully", likes))
}

async fn unlike(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let likes = state
        .group_post_service
        .unlike_post(&group_id, &post_id, caller.as_deref())
        .await?;

    Ok(with_message("Post unliked successfully", likes))
}

async fn add_comment(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id)): Path<(String, String)>,
    JsonBody(body): JsonBody<CommentBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let added = state
        .group_post_service
        .add_comment(&group_id, &post_id, caller.as_deref(), body.comment)
        .await?;

    Ok(created(with_message("Comment added successfully", added)))
}

async fn delete_comment(
    caller: HeaderCaller,
    State(state): State<AppState>,
    Path((group_id, post_id, comment_id)): Path<(String, String, String)>,
    JsonBody(body): JsonBody<CallerBody>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.or_explicit(body.user_id);
    let comments = state
        .group_post_service
        .delete_comment(&group_id, &post_id, &comment_id, caller.as_deref())
        .await?;

    Ok(with_message(
        "Comment deleted successfully",
        CommentsResponse {
            comments_count: comments.len(),
            comments,
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/posts", get(list).post(create))
        .route(
            "/{id}/posts/{post_id}",
            get(show).put(update).delete(remove),
        )
        .route("/{id}/posts/{post_id}/like", post(like).delete(unlike))
        .route("/{id}/posts/{post_id}/comments", post(add_comment))
        .route(
            "/{id}/posts/{post_id}/comments/{comment_id}",
            delete(delete_comment),
        )
}
