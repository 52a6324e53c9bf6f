mod comments;
mod error;
mod likes;
mod pagination;
mod posts;
mod users;

use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{SessionIssuer, SessionSettings};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::KeyMaterial;

/// State shared by every API handler.
#[derive(Clone)]
pub struct ApiState {
    pub db: Database,
    pub keys: Arc<KeyMaterial>,
    pub sessions: SessionIssuer,
}

impl_has_auth_backend!(ApiState);

/// Create the API router.
pub fn create_api_router(db: Database, keys: Arc<KeyMaterial>, settings: SessionSettings) -> Router {
    let state = ApiState {
        sessions: SessionIssuer::new(keys.clone(), settings, db.users()),
        db,
        keys,
    };

    let posts_router = posts::router(state.clone())
        .merge(comments::router(state.clone()))
        .merge(likes::router(state.clone()));

    Router::new()
        .route("/status", get(status))
        .nest("/users", users::router(state))
        .nest("/posts", posts_router)
}

/// Success envelope: `{"status": "success", "data": ...}`.
#[derive(Serialize)]
pub struct Success<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        results: None,
        data,
    })
}

/// Success envelope for lists, with the number of items returned.
pub fn success_list<T: Serialize>(data: Vec<T>) -> Json<Success<Vec<T>>> {
    Json(Success {
        status: "success",
        results: Some(data.len()),
        data,
    })
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success",
        message: "Social posts API is running",
    })
}
