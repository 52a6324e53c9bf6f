//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::auth::{AuthError, INTERNAL_MESSAGE, SessionError, UNAUTHENTICATED_MESSAGE};

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::db_error(msg, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Unauthorized,
    Conflict(String),
    Internal,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Log the cause and return a generic internal error.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal
    }

    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        Self::internal(context, e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE.into()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.into()),
        };
        let status_text = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };
        (
            status,
            Json(ErrorResponse {
                status: status_text,
                message,
            }),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => ApiError::Unauthorized,
            AuthError::Internal => ApiError::Internal,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(msg) => ApiError::bad_request(msg),
            SessionError::Conflict => ApiError::conflict("User with that email already exists"),
            SessionError::InvalidCredentials => ApiError::bad_request("Invalid email or password"),
            SessionError::Unauthenticated => ApiError::Unauthorized,
            SessionError::Storage(e) => ApiError::db_error("Session storage failure", e),
            e @ (SessionError::Hash(_) | SessionError::Token(_)) => {
                ApiError::internal("Failed to issue credentials", e)
            }
        }
    }
}

/// JSON body extractor whose rejections use the API error envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::bad_request(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Validate a UUID string format.
pub fn validate_uuid(uuid: &str) -> Result<(), ApiError> {
    if uuid.is_empty() {
        return Err(ApiError::bad_request("ID cannot be empty"));
    }
    if uuid.len() > 36 {
        return Err(ApiError::bad_request("ID is too long"));
    }
    if uuid::Uuid::parse_str(uuid).is_err() {
        return Err(ApiError::bad_request("Invalid ID format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, json) = body_json(ApiError::db_error("Failed", "disk on fire")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_login_failures_map_to_same_response() {
        let (status, json) = body_json(SessionError::InvalidCredentials.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "fail");
        assert_eq!(json["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_forbidden_is_not_unauthorized() {
        let (status, json) = body_json(ApiError::forbidden("Not yours")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["status"], "fail");

        let (status, json) = body_json(AuthError::Unauthenticated.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "You are not logged in");
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid(&uuid::Uuid::new_v4().to_string()).is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
