//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The one message every 401 carries, whatever the underlying reason.
pub const UNAUTHENTICATED_MESSAGE: &str = "You are not logged in";

/// Generic body for failures whose detail stays in the logs.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Rejection produced by the authentication middleware and extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, invalid or expired credential, or the identity no longer exists.
    Unauthenticated,
    /// The user store could not be queried.
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    status: "fail",
                    message: UNAUTHENTICATED_MESSAGE,
                },
            ),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    message: INTERNAL_MESSAGE,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
