//! Comment endpoints, nested under a post.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use super::error::{ApiError, JsonBody, ResultExt, validate_uuid};
use super::pagination::PageQuery;
use super::{ApiState, success, success_list};
use crate::auth::{CurrentUser, ensure_owner, require_auth};
use crate::db::{Comment, User};

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/{post_id}/comment", post(create_comment))
        .route(
            "/{post_id}/comment/{comment_id}/update",
            put(update_comment),
        )
        .route(
            "/{post_id}/comment/{comment_id}/delete",
            delete(delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<ApiState>,
        ));

    Router::new()
        .route("/{post_id}/comments", get(list_comments))
        .merge(protected)
        .with_state(state)
}

#[derive(Deserialize)]
struct CommentRequest {
    text: String,
}

fn validate_text(text: &str) -> Result<&str, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Comment text cannot be empty"));
    }
    Ok(text)
}

async fn ensure_post_exists(state: &ApiState, post_id: &str) -> Result<(), ApiError> {
    validate_uuid(post_id)?;

    state
        .db
        .posts()
        .get_by_id(post_id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("No post with that ID exists"))?;
    Ok(())
}

/// Load a comment for mutation. It must exist under `post_id` (404), then be
/// owned by `user` (403).
async fn owned_comment(
    state: &ApiState,
    user: &User,
    post_id: &str,
    comment_id: &str,
    action: &str,
) -> Result<Comment, ApiError> {
    validate_uuid(post_id)?;
    validate_uuid(comment_id)?;

    let comment = state
        .db
        .comments()
        .get_by_id(comment_id)
        .await
        .db_err("Failed to get comment")?
        .filter(|comment| comment.post_id == post_id)
        .ok_or_else(|| ApiError::not_found("No comment with that ID exists"))?;

    ensure_owner(user, &comment).map_err(|_| {
        ApiError::forbidden(format!("You are not authorized to {} this comment", action))
    })?;

    Ok(comment)
}

async fn list_comments(
    State(state): State<ApiState>,
    Path(post_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_post_exists(&state, &post_id).await?;
    let (limit, offset) = page.limit_offset();

    let comments = state
        .db
        .comments()
        .list_by_post(&post_id, limit, offset)
        .await
        .db_err("Failed to list comments")?;

    Ok(success_list(comments))
}

async fn create_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = validate_text(&payload.text)?;
    ensure_post_exists(&state, &post_id).await?;

    let comment = state
        .db
        .comments()
        .create(&user.id, &post_id, text)
        .await
        .db_err("Failed to create comment")?;

    Ok((StatusCode::CREATED, success(comment)))
}

async fn update_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((post_id, comment_id)): Path<(String, String)>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_comment(&state, &user, &post_id, &comment_id, "update").await?;
    let text = validate_text(&payload.text)?;

    let comment = state
        .db
        .comments()
        .update_text(&comment_id, text)
        .await
        .db_err("Failed to update comment")?
        .ok_or_else(|| ApiError::not_found("No comment with that ID exists"))?;

    Ok(success(comment))
}

async fn delete_comment(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    owned_comment(&state, &user, &post_id, &comment_id, "delete").await?;

    let deleted = state
        .db
        .comments()
        .delete(&comment_id)
        .await
        .db_err("Failed to delete comment")?;

    if !deleted {
        return Err(ApiError::not_found("No comment with that ID exists"));
    }

    Ok(StatusCode::NO_CONTENT)
}
