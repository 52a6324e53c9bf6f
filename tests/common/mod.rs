#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use popsocial::{
    ServerConfig,
    auth::hash_password,
    create_app,
    db::{Database, NewUser, Post, User},
    jwt::{self, KeyMaterial},
};
use tower::ServiceExt;

pub const PASSWORD: &str = "pw123456";
pub const CLIENT_ORIGIN: &str = "http://localhost:3000";

pub const ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const REFRESH_TTL: Duration = Duration::from_secs(60 * 60);

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub keys: Arc<KeyMaterial>,
}

/// Build the full application against a fresh in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let keys = Arc::new(KeyMaterial::generate().expect("Failed to generate keys"));
    let config = ServerConfig {
        db: db.clone(),
        keys: keys.clone(),
        access_ttl: ACCESS_TTL,
        refresh_ttl: REFRESH_TTL,
        cookie_domain: None,
        secure_cookies: false,
        client_origin: CLIENT_ORIGIN.to_string(),
    };
    TestApp {
        app: create_app(&config),
        db,
        keys,
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

impl Response {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    pub fn cookie_starting_with(&self, prefix: &str) -> Option<String> {
        self.set_cookies().into_iter().find(|c| c.starts_with(prefix))
    }
}

impl TestApp {
    /// Insert a user directly, with `PASSWORD` as password.
    pub async fn create_user(&self, name: &str, email: &str) -> User {
        let password_hash = hash_password(PASSWORD).unwrap();
        self.db
            .users()
            .create(&NewUser {
                name,
                email,
                password_hash: &password_hash,
            })
            .await
            .unwrap()
    }

    /// Insert a user and mint an access token for it.
    pub async fn create_authenticated_user(&self, name: &str, email: &str) -> (User, String) {
        let user = self.create_user(name, email).await;
        let token = self.access_token(&user.id);
        (user, token)
    }

    pub fn access_token(&self, user_id: &str) -> String {
        jwt::issue(user_id, ACCESS_TTL, self.keys.access.encoding_key())
            .unwrap()
            .token
    }

    pub fn refresh_token(&self, user_id: &str) -> String {
        jwt::issue(user_id, REFRESH_TTL, self.keys.refresh.encoding_key())
            .unwrap()
            .token
    }

    pub async fn create_post(&self, user_id: &str, title: &str) -> Post {
        self.db
            .posts()
            .create(user_id, title, "Body", "image.jpg", "video.mp4")
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        Response {
            status,
            headers,
            json,
        }
    }
}

/// Request with an optional bearer token and no body.
pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Request with an optional bearer token and a JSON body.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Request carrying only a cookie header.
pub fn cookie_request(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

/// Extract the value part of a `Set-Cookie` header.
pub fn cookie_value(set_cookie: &str) -> &str {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value)
        .unwrap_or("")
}
