pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;

use api::create_api_router;
use auth::{CookieSettings, SessionSettings};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use db::Database;
use jwt::KeyMaterial;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Origin of the API itself, always allowed alongside the client origin.
pub const LOCAL_API_ORIGIN: &str = "http://localhost:8000";

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Access and refresh key pairs
    pub keys: Arc<KeyMaterial>,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// Domain attribute for session cookies
    pub cookie_domain: Option<String>,
    /// Whether to set the Secure flag on access cookies (the refresh cookie is always Secure)
    pub secure_cookies: bool,
    /// Browser origin allowed to make credentialed cross-origin requests
    pub client_origin: String,
}

/// CORS for the web client. Credentials are allowed, so origins, methods and
/// headers are listed explicitly.
fn cors_layer(client_origin: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = [client_origin, LOCAL_API_ORIGIN]
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let settings = SessionSettings {
        access_ttl: config.access_ttl,
        refresh_ttl: config.refresh_ttl,
        cookies: CookieSettings {
            domain: config.cookie_domain.clone(),
            secure: config.secure_cookies,
        },
    };

    Router::new()
        .nest(
            "/api",
            create_api_router(config.db.clone(), config.keys.clone(), settings),
        )
        .layer(cors_layer(&config.client_origin))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
