//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;
use std::time::Duration;

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{KeyMaterial, PemKeyPair};
use clap::Parser;
use tracing::{error, info};
use url::Url;

const ACCESS_PRIVATE_KEY_ENV: &str = "ACCESS_TOKEN_PRIVATE_KEY";
const REFRESH_PRIVATE_KEY_ENV: &str = "REFRESH_TOKEN_PRIVATE_KEY";

/// Longest accepted token lifetime, one year in minutes.
pub const MAX_TTL_MINUTES: u64 = 525_600;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "popsocial",
    about = "Social posts API with token authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_URL", default_value = "popsocial.db")]
    pub database: String,

    /// Base64-encoded PEM private key used to sign access tokens
    #[arg(long, env = "ACCESS_TOKEN_PRIVATE_KEY", hide_env_values = true)]
    pub access_token_private_key: Option<String>,

    /// Base64-encoded PEM public key used to verify access tokens
    #[arg(long, env = "ACCESS_TOKEN_PUBLIC_KEY")]
    pub access_token_public_key: Option<String>,

    /// Base64-encoded PEM private key used to sign refresh tokens
    #[arg(long, env = "REFRESH_TOKEN_PRIVATE_KEY", hide_env_values = true)]
    pub refresh_token_private_key: Option<String>,

    /// Base64-encoded PEM public key used to verify refresh tokens
    #[arg(long, env = "REFRESH_TOKEN_PUBLIC_KEY")]
    pub refresh_token_public_key: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TOKEN_EXPIRES_IN", default_value = "15", value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_MINUTES))]
    pub access_token_ttl: u64,

    /// Refresh token lifetime in minutes
    #[arg(long, env = "REFRESH_TOKEN_EXPIRES_IN", default_value = "60", value_parser = clap::value_parser!(u64).range(1..=MAX_TTL_MINUTES))]
    pub refresh_token_ttl: u64,

    /// Domain attribute for session cookies
    #[arg(long, env = "COOKIE_DOMAIN")]
    pub cookie_domain: Option<String>,

    /// Origin of the web client. An https origin marks access cookies Secure
    #[arg(long, env = "CLIENT_ORIGIN", default_value = "http://localhost:3000")]
    pub client_origin: String,

    /// Print freshly generated key pairs as environment assignments and exit
    #[arg(long)]
    pub generate_keys: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Generate an access and a refresh key pair, formatted as environment assignments.
pub fn generated_key_env() -> Result<String, crate::jwt::KeyError> {
    let (access_private, access_public) = PemKeyPair::generate()?.to_base64();
    let (refresh_private, refresh_public) = PemKeyPair::generate()?.to_base64();

    Ok(format!(
        "{}={}\nACCESS_TOKEN_PUBLIC_KEY={}\n{}={}\nREFRESH_TOKEN_PUBLIC_KEY={}",
        ACCESS_PRIVATE_KEY_ENV,
        access_private,
        access_public,
        REFRESH_PRIVATE_KEY_ENV,
        refresh_private,
        refresh_public
    ))
}

/// Load both key pairs from their base64 PEM values.
/// Returns None and logs an error if a key is missing or invalid.
pub fn load_key_material(args: &Args) -> Option<KeyMaterial> {
    let pair = |kind: &str, private: Option<&str>, public: Option<&str>| {
        let (Some(private), Some(public)) = (private, public) else {
            error!(
                "The {} token key pair is required. Run with --generate-keys to create one",
                kind
            );
            return None;
        };
        match PemKeyPair::from_base64(private, public) {
            Ok(pem) => Some(pem),
            Err(e) => {
                error!(error = %e, "Invalid {} token key", kind);
                None
            }
        }
    };

    let access = pair(
        "access",
        args.access_token_private_key.as_deref(),
        args.access_token_public_key.as_deref(),
    )?;
    let refresh = pair(
        "refresh",
        args.refresh_token_private_key.as_deref(),
        args.refresh_token_public_key.as_deref(),
    )?;

    // Clear the private keys from the environment to prevent leaking
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading these environment variables.
    unsafe {
        std::env::remove_var(ACCESS_PRIVATE_KEY_ENV);
        std::env::remove_var(REFRESH_PRIVATE_KEY_ENV);
    }

    match KeyMaterial::from_pem(&access, &refresh) {
        Ok(keys) => Some(keys),
        Err(e) => {
            error!(error = %e, "Invalid token key material");
            None
        }
    }
}

/// Parse and validate the client origin URL.
/// Returns None and logs an error if validation fails.
pub fn validate_client_origin(client_origin: &str) -> Option<Url> {
    let url = match Url::parse(client_origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %client_origin, error = %e, "Invalid client-origin URL");
            return None;
        }
    };

    if url.scheme() != "https" && url.scheme() != "http" {
        error!(origin = %client_origin, "client-origin must be an http or https URL");
        return None;
    }

    Some(url)
}

/// Convert a lifetime in minutes, rejecting values that overflow.
fn minutes(value: u64) -> Option<Duration> {
    value.checked_mul(60).map(Duration::from_secs)
}

/// Build ServerConfig from validated arguments.
/// Returns None and logs an error if a token lifetime is out of range.
pub fn build_config(
    args: &Args,
    db: Database,
    keys: KeyMaterial,
    client_origin: &Url,
) -> Option<ServerConfig> {
    let (Some(access_ttl), Some(refresh_ttl)) =
        (minutes(args.access_token_ttl), minutes(args.refresh_token_ttl))
    else {
        error!("Token lifetime is out of range");
        return None;
    };

    Some(ServerConfig {
        db,
        keys: Arc::new(keys),
        access_ttl,
        refresh_ttl,
        cookie_domain: args.cookie_domain.clone().filter(|d| !d.is_empty()),
        secure_cookies: client_origin.scheme() == "https",
        client_origin: client_origin.origin().ascii_serialization(),
    })
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
