//! Account endpoints: registration, sign-in, token refresh, logout and the
//! current user.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, JsonBody};
use super::{ApiState, success};
use crate::auth::{
    ACCESS_COOKIE_NAME, CurrentUser, LOGGED_IN_COOKIE_NAME, REFRESH_COOKIE_NAME, SignUpInput,
    get_cookie, require_auth,
};
use crate::db::User;

pub fn router(state: ApiState) -> Router {
    let protected = Router::new()
        .route("/me", get(get_me))
        .route("/logout", get(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<ApiState>,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", get(refresh))
        .merge(protected)
        .with_state(state)
}

#[derive(Deserialize)]
struct SignUpRequest {
    name: String,
    email: String,
    password: String,
    #[serde(rename = "passwordConfirm")]
    password_confirm: String,
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Serialize)]
struct UserResponse {
    id: String,
    name: String,
    email: String,
    created_at: String,
    updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
struct UserEnvelope {
    user: UserResponse,
}

#[derive(Serialize)]
struct TokenResponse {
    status: &'static str,
    access_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    status: &'static str,
}

async fn register(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<SignUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .sessions
        .signup(&SignUpInput {
            name: &payload.name,
            email: &payload.email,
            password: &payload.password,
            password_confirm: &payload.password_confirm,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        success(UserEnvelope { user: user.into() }),
    ))
}

async fn login(
    State(state): State<ApiState>,
    JsonBody(payload): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, pair) = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    let cookies = &state.sessions.settings().cookies;
    let headers = AppendHeaders([
        (
            SET_COOKIE,
            cookies.refresh_cookie(&pair.refresh.token, pair.refresh.duration),
        ),
        (
            SET_COOKIE,
            cookies.access_cookie(&pair.access.token, pair.access.duration),
        ),
        (SET_COOKIE, cookies.logged_in_cookie(pair.access.duration)),
    ]);

    Ok((
        headers,
        Json(TokenResponse {
            status: "success",
            access_token: pair.access.token,
        }),
    ))
}

/// Mint a new access token from the refresh cookie. The refresh cookie is left untouched.
async fn refresh(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let access = state
        .sessions
        .refresh(get_cookie(&headers, REFRESH_COOKIE_NAME))
        .await?;

    let cookies = &state.sessions.settings().cookies;
    let set_cookies = AppendHeaders([
        (
            SET_COOKIE,
            cookies.access_cookie(&access.token, access.duration),
        ),
        (SET_COOKIE, cookies.logged_in_cookie(access.duration)),
    ]);

    Ok((
        set_cookies,
        Json(TokenResponse {
            status: "success",
            access_token: access.token,
        }),
    ))
}

async fn logout(State(state): State<ApiState>, CurrentUser(user): CurrentUser) -> impl IntoResponse {
    tracing::info!("User {} signed out", user.id);

    let cookies = &state.sessions.settings().cookies;
    (
        AppendHeaders([
            (SET_COOKIE, cookies.clear_cookie(REFRESH_COOKIE_NAME)),
            (SET_COOKIE, cookies.clear_cookie(ACCESS_COOKIE_NAME)),
            (SET_COOKIE, cookies.clear_cookie(LOGGED_IN_COOKIE_NAME)),
        ]),
        Json(MessageResponse { status: "success" }),
    )
}

async fn get_me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    success(UserEnvelope { user: user.into() })
}
