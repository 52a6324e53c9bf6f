//! Like endpoints, nested under a post.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, post},
};

use super::error::{ApiError, ResultExt, validate_uuid};
use super::{ApiState, success};
use crate::auth::{CurrentUser, ensure_owner, require_auth};
use crate::db::is_unique_violation;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/{post_id}/like", post(create_like))
        .route("/{post_id}/like/{like_id}/delete", delete(delete_like))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<ApiState>,
        ))
        .with_state(state)
}

async fn create_like(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&post_id)?;

    state
        .db
        .posts()
        .get_by_id(&post_id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("No post with that ID exists"))?;

    let like = state
        .db
        .likes()
        .create(&user.id, &post_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Like already exists for this post against current user")
            } else {
                ApiError::db_error("Failed to create like", e)
            }
        })?;

    Ok((StatusCode::CREATED, success(like)))
}

async fn delete_like(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((post_id, like_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&post_id)?;
    validate_uuid(&like_id)?;

    // Existence first, then ownership
    let like = state
        .db
        .likes()
        .get_by_id(&like_id)
        .await
        .db_err("Failed to get like")?
        .filter(|like| like.post_id == post_id)
        .ok_or_else(|| ApiError::not_found("No like with that ID exists"))?;

    ensure_owner(&user, &like)
        .map_err(|_| ApiError::forbidden("You are not authorized to remove this like"))?;

    let deleted = state
        .db
        .likes()
        .delete(&like_id)
        .await
        .db_err("Failed to delete like")?;

    if !deleted {
        return Err(ApiError::not_found("No like with that ID exists"));
    }

    Ok(StatusCode::NO_CONTENT)
}
