//! Locating the access credential on an incoming request.

use axum::http::{HeaderMap, header};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};

/// No usable access credential was presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no access credential presented")]
pub struct NoCredential;

/// Find the raw access token.
///
/// An `Authorization: Bearer <token>` header wins. A header that is missing,
/// uses another scheme, or carries only whitespace counts as absent, and the
/// `access_token` cookie is consulted instead.
pub fn extract_credential(headers: &HeaderMap) -> Result<&str, NoCredential> {
    if let Some(token) = bearer_token(headers) {
        return Ok(token);
    }

    match get_cookie(headers, ACCESS_COOKIE_NAME) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(NoCredential),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
