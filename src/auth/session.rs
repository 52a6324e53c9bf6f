//! Sign-up, sign-in and access token refresh.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cookie::CookieSettings;
use super::password;
use crate::db::{NewUser, User, UserStore, is_unique_violation};
use crate::jwt::{self, IssuedToken, KeyMaterial, TokenError};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Token lifetimes and cookie attributes, fixed at startup.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub cookies: CookieSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("an account with this email already exists")]
    Conflict,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("failed to sign token: {0}")]
    Token(#[from] TokenError),
}

/// Sign-up form fields.
pub struct SignUpInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Tokens minted by a successful sign-in.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues credentials against the user store.
#[derive(Clone)]
pub struct SessionIssuer {
    keys: Arc<KeyMaterial>,
    settings: SessionSettings,
    users: UserStore,
}

impl SessionIssuer {
    pub fn new(keys: Arc<KeyMaterial>, settings: SessionSettings, users: UserStore) -> Self {
        Self {
            keys,
            settings,
            users,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Register a new account. Nothing is stored unless every check passes.
    pub async fn signup(&self, input: &SignUpInput<'_>) -> Result<User, SessionError> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(SessionError::Validation("Name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(SessionError::Validation("A valid email is required"));
        }
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SessionError::Validation(
                "Password must be at least 8 characters",
            ));
        }
        if input.password != input.password_confirm {
            return Err(SessionError::Validation("Passwords do not match"));
        }

        let password_hash =
            password::hash_password(input.password).map_err(|e| SessionError::Hash(e.to_string()))?;

        let user = self
            .users
            .create(&NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    SessionError::Conflict
                } else {
                    SessionError::Storage(e)
                }
            })?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check primary credentials and mint an access/refresh pair.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, CredentialPair), SessionError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.get_by_email(&email).await? else {
            password::verify_dummy(password);
            return Err(SessionError::InvalidCredentials);
        };

        if !password::verify_password(password, &user.password_hash) {
            debug!("Wrong password for user {}", user.id);
            return Err(SessionError::InvalidCredentials);
        }

        let access = jwt::issue(
            &user.id,
            self.settings.access_ttl,
            self.keys.access.encoding_key(),
        )?;
        let refresh = jwt::issue(
            &user.id,
            self.settings.refresh_ttl,
            self.keys.refresh.encoding_key(),
        )?;

        info!("User {} signed in", user.id);
        Ok((user, CredentialPair { access, refresh }))
    }

    /// Mint a new access token from the refresh cookie value.
    ///
    /// The refresh token itself is not re-issued.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<IssuedToken, SessionError> {
        let token = refresh_token
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::Unauthenticated)?;

        let claims = jwt::verify(token, self.keys.refresh.decoding_key()).map_err(|e| {
            warn!("Refresh rejected: {}", e);
            SessionError::Unauthenticated
        })?;

        let user = self.users.get_by_id(&claims.sub).await?.ok_or_else(|| {
            warn!("Refresh rejected: user {} no longer exists", claims.sub);
            SessionError::Unauthenticated
        })?;

        Ok(jwt::issue(
            &user.id,
            self.settings.access_ttl,
            self.keys.access.encoding_key(),
        )?)
    }
}
