//! Cookie parsing and `Set-Cookie` construction for session cookies.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::header;
use httpdate::fmt_http_date;

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token. Only the refresh endpoint reads it.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Script-readable hint that a session exists. Carries no credential.
pub const LOGGED_IN_COOKIE_NAME: &str = "logged_in";

/// Upper bound on `Max-Age`, 400 days. Browsers cap longer lifetimes anyway.
pub const MAX_COOKIE_AGE: u64 = 400 * 24 * 60 * 60;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Attributes shared by every session cookie the server sets.
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    /// Optional `Domain` attribute.
    pub domain: Option<String>,
    /// Whether the access and hint cookies are marked `Secure`.
    /// The refresh cookie is always `Secure`.
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value for the refresh token.
    pub fn refresh_cookie(&self, token: &str, max_age: u64) -> String {
        self.build(REFRESH_COOKIE_NAME, token, Some(max_age), true, true)
    }

    /// `Set-Cookie` value for the access token.
    pub fn access_cookie(&self, token: &str, max_age: u64) -> String {
        self.build(ACCESS_COOKIE_NAME, token, Some(max_age), true, self.secure)
    }

    /// `Set-Cookie` value for the `logged_in` hint.
    pub fn logged_in_cookie(&self, max_age: u64) -> String {
        self.build(LOGGED_IN_COOKIE_NAME, "true", Some(max_age), false, self.secure)
    }

    /// `Set-Cookie` value that makes the browser drop `name` immediately.
    pub fn clear_cookie(&self, name: &str) -> String {
        let http_only = name != LOGGED_IN_COOKIE_NAME;
        let secure = name == REFRESH_COOKIE_NAME || self.secure;
        self.build(name, "", None, http_only, secure)
    }

    fn build(
        &self,
        name: &str,
        value: &str,
        max_age: Option<u64>,
        http_only: bool,
        secure: bool,
    ) -> String {
        let mut parts = vec![format!("{}={}", name, value), "Path=/".to_string()];

        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={}", domain));
        }
        if secure {
            parts.push("Secure".to_string());
        }
        if http_only {
            parts.push("HttpOnly".to_string());
        }
        parts.push("SameSite=Lax".to_string());

        match max_age {
            Some(max_age) => {
                let max_age = max_age.min(MAX_COOKIE_AGE);
                let expires = SystemTime::now() + Duration::from_secs(max_age);
                parts.push(format!("Max-Age={}", max_age));
                parts.push(format!("Expires={}", fmt_http_date(expires)));
            }
            None => {
                parts.push("Max-Age=0".to_string());
                parts.push(format!("Expires={}", fmt_http_date(UNIX_EPOCH)));
            }
        }

        parts.join("; ")
    }
}
