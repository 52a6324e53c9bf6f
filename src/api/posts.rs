//! Posts API.
//!
//! Reads are public. Creating requires authentication, and updating or
//! deleting additionally requires owning the post.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;

use super::error::{ApiError, JsonBody, ResultExt, validate_uuid};
use super::pagination::PageQuery;
use super::{ApiState, success, success_list};
use crate::auth::{CurrentUser, ensure_owner, require_auth};
use crate::db::{Post, PostChanges, is_unique_violation};

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/", post(create_post))
        .route("/user", get(list_user_posts))
        .route("/{post_id}", put(update_post).delete(delete_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<ApiState>,
        ));

    Router::new()
        .route("/", get(list_posts))
        .route("/{post_id}", get(get_post))
        .merge(protected)
        .with_state(state)
}

// --- Request types ---

#[derive(Deserialize)]
struct CreatePostRequest {
    title: String,
    content: String,
    #[serde(rename = "imagePath")]
    image_path: String,
    #[serde(rename = "videoPath")]
    video_path: String,
}

#[derive(Deserialize)]
struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    #[serde(rename = "imagePath")]
    image_path: Option<String>,
    #[serde(rename = "videoPath")]
    video_path: Option<String>,
}

// --- Helpers ---

fn require_non_empty(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn title_conflict(e: sqlx::Error, context: &str) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::conflict("Post with that title already exists")
    } else {
        ApiError::db_error(context, e)
    }
}

/// Load a post for mutation: 404 if it does not exist, then 403 unless owned by `user`.
async fn owned_post(
    state: &ApiState,
    user: &crate::db::User,
    post_id: &str,
    action: &str,
) -> Result<Post, ApiError> {
    validate_uuid(post_id)?;

    let post = state
        .db
        .posts()
        .get_by_id(post_id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("No post with that ID exists"))?;

    ensure_owner(user, &post).map_err(|_| {
        ApiError::forbidden(format!("You are not authorized to {} this post", action))
    })?;

    Ok(post)
}

// --- Handlers ---

async fn create_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_non_empty(&payload.title, "Title")?;
    require_non_empty(&payload.content, "Content")?;
    require_non_empty(&payload.image_path, "Image path")?;
    require_non_empty(&payload.video_path, "Video path")?;

    let post = state
        .db
        .posts()
        .create(
            &user.id,
            payload.title.trim(),
            &payload.content,
            &payload.image_path,
            &payload.video_path,
        )
        .await
        .map_err(|e| title_conflict(e, "Failed to create post"))?;

    Ok((StatusCode::CREATED, success(post)))
}

async fn list_posts(
    State(state): State<ApiState>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = page.limit_offset();

    let posts = state
        .db
        .posts()
        .list(limit, offset)
        .await
        .db_err("Failed to list posts")?;

    Ok(success_list(posts))
}

async fn list_user_posts(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = page.limit_offset();

    let posts = state
        .db
        .posts()
        .list_by_user(&user.id, limit, offset)
        .await
        .db_err("Failed to list posts")?;

    Ok(success_list(posts))
}

async fn get_post(
    State(state): State<ApiState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&post_id)?;

    let post = state
        .db
        .posts()
        .get_with_counts(&post_id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("No post with that ID exists"))?;

    Ok(success(post))
}

async fn update_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    JsonBody(payload): JsonBody<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    owned_post(&state, &user, &post_id, "update").await?;

    if let Some(title) = &payload.title {
        require_non_empty(title, "Title")?;
    }

    let changes = PostChanges {
        title: payload.title.as_deref().map(str::trim),
        content: payload.content.as_deref(),
        image_path: payload.image_path.as_deref(),
        video_path: payload.video_path.as_deref(),
    };

    let post = state
        .db
        .posts()
        .update(&post_id, &changes)
        .await
        .map_err(|e| title_conflict(e, "Failed to update post"))?
        .ok_or_else(|| ApiError::not_found("No post with that ID exists"))?;

    Ok(success(post))
}

async fn delete_post(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    owned_post(&state, &user, &post_id, "delete").await?;

    let deleted = state
        .db
        .posts()
        .delete(&post_id)
        .await
        .db_err("Failed to delete post")?;

    if !deleted {
        return Err(ApiError::not_found("No post with that ID exists"));
    }

    Ok(StatusCode::NO_CONTENT)
}
