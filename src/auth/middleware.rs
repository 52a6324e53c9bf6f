//! Request authentication.
//!
//! [`require_auth`] runs in front of every protected route. It turns the
//! presented access token into a [`CurrentIdentity`] request extension, and
//! handlers read that identity through the [`CurrentUser`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use super::credential::extract_credential;
use super::errors::AuthError;
use super::state::HasAuthBackend;
use crate::db::User;
use crate::jwt;

/// The authenticated identity, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub User);

/// Middleware rejecting any request without a valid access token.
///
/// Use with `axum::middleware::from_fn_with_state(state, require_auth::<MyState>)`.
/// Never refreshes an expired token: the client must call the refresh endpoint.
pub async fn require_auth<S>(State(state): State<S>, mut request: Request, next: Next) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let result = authenticate(request.headers(), &state).await;
    match result {
        Ok(user) => {
            request.extensions_mut().insert(CurrentIdentity(user));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate<S: HasAuthBackend>(headers: &HeaderMap, state: &S) -> Result<User, AuthError> {
    let token = extract_credential(headers).map_err(|_| {
        debug!("Rejected request without access credential");
        AuthError::Unauthenticated
    })?;

    let claims = jwt::verify(token, state.keys().access.decoding_key()).map_err(|e| {
        debug!("Rejected access token: {}", e);
        AuthError::Unauthenticated
    })?;

    state
        .db()
        .users()
        .get_by_id(&claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user: {}", e);
            AuthError::Internal
        })?
        .ok_or_else(|| {
            debug!("Rejected access token for unknown user {}", claims.sub);
            AuthError::Unauthenticated
        })
}

/// Extractor for the identity established by [`require_auth`].
///
/// Fails closed with 401 when the middleware did not run for the route.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .map(|identity| CurrentUser(identity.0.clone()))
            .ok_or(AuthError::Unauthenticated)
    }
}
