//! Token authentication and ownership authorization.
//!
//! Two-token system: short-lived access tokens sent as a bearer header (or
//! the `access_token` cookie), and longer-lived refresh tokens that only
//! travel in an http-only cookie and only mint new access tokens. Both are
//! stateless. Updates and deletes additionally require that the caller owns
//! the record.

mod cookie;
mod credential;
mod errors;
mod middleware;
mod ownership;
mod password;
mod session;
mod state;

pub use cookie::{
    ACCESS_COOKIE_NAME, CookieSettings, LOGGED_IN_COOKIE_NAME, REFRESH_COOKIE_NAME, get_cookie,
};
pub use credential::{NoCredential, extract_credential};
pub use errors::{AuthError, INTERNAL_MESSAGE, UNAUTHENTICATED_MESSAGE};
pub use middleware::{CurrentIdentity, CurrentUser, require_auth};
pub use ownership::{Forbidden, Owned, authorize, ensure_owner};
pub use password::{hash_password, verify_password};
pub use session::{
    CredentialPair, MIN_PASSWORD_LENGTH, SessionError, SessionIssuer, SessionSettings, SignUpInput,
};
pub use state::HasAuthBackend;
