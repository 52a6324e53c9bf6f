//! Tests for request authentication on protected routes.

mod common;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{cookie_request, create_test_app, json_request, request};
use popsocial::jwt::{self, KeyMaterial};
use serde_json::json;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let t = create_test_app().await;
    let (user, token) = t.create_authenticated_user("A", "a@x.com").await;

    let response = t.send(request("GET", "/api/users/me", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["user"]["id"], user.id.as_str());
}

#[tokio::test]
async fn test_access_cookie_authenticates() {
    let t = create_test_app().await;
    let (_, token) = t.create_authenticated_user("A", "a@x.com").await;

    let response = t
        .send(cookie_request(
            "GET",
            "/api/users/me",
            &format!("access_token={}", token),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_lowercase_bearer_scheme() {
    let t = create_test_app().await;
    let (_, token) = t.create_authenticated_user("A", "a@x.com").await;

    let response = t
        .send(
            Request::builder()
                .uri("/api/users/me")
                .header("authorization", format!("bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_header_takes_precedence_over_cookie() {
    let t = create_test_app().await;
    let (alice, alice_token) = t.create_authenticated_user("Alice", "alice@x.com").await;
    let (_, bob_token) = t.create_authenticated_user("Bob", "bob@x.com").await;

    let response = t
        .send(
            Request::builder()
                .uri("/api/users/me")
                .header("authorization", format!("Bearer {}", alice_token))
                .header("cookie", format!("access_token={}", bob_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["data"]["user"]["id"], alice.id.as_str());
}

#[tokio::test]
async fn test_missing_credential() {
    let t = create_test_app().await;

    let response = t.send(request("GET", "/api/users/me", None)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json["status"], "fail");
    assert_eq!(response.json["message"], "You are not logged in");
}

#[tokio::test]
async fn test_expired_access_token_is_not_refreshed() {
    let t = create_test_app().await;
    let user = t.create_user("A", "a@x.com").await;
    let expired = jwt::issue_at(
        &user.id,
        Duration::from_secs(60),
        t.keys.access.encoding_key(),
        now() - 3600,
    )
    .unwrap()
    .token;
    let refresh = t.refresh_token(&user.id);

    // A valid refresh cookie alongside does not rescue the request
    let response = t
        .send(
            Request::builder()
                .uri("/api/users/me")
                .header("authorization", format!("Bearer {}", expired))
                .header("cookie", format!("refresh_token={}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookies().is_empty());
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let t = create_test_app().await;
    let user = t.create_user("A", "a@x.com").await;
    let refresh = t.refresh_token(&user.id);

    let response = t.send(request("GET", "/api/users/me", Some(&refresh))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_key_material_rejected() {
    let t = create_test_app().await;
    let user = t.create_user("A", "a@x.com").await;
    let foreign = KeyMaterial::generate().unwrap();
    let token = jwt::issue(
        &user.id,
        Duration::from_secs(60),
        foreign.access.encoding_key(),
    )
    .unwrap()
    .token;

    let response = t.send(request("GET", "/api/users/me", Some(&token))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_token_rejected() {
    let t = create_test_app().await;

    let response = t
        .send(request("GET", "/api/users/me", Some("not.a.token")))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json["message"], "You are not logged in");
}

#[tokio::test]
async fn test_token_for_deleted_user_rejected() {
    let t = create_test_app().await;
    let (user, token) = t.create_authenticated_user("A", "a@x.com").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user.id)
        .execute(t.db.pool())
        .await
        .unwrap();

    let response = t.send(request("GET", "/api/users/me", Some(&token))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_mutation_without_credential() {
    let t = create_test_app().await;

    let response = t
        .send(json_request(
            "POST",
            "/api/posts",
            None,
            json!({"title": "T", "content": "C", "imagePath": "i", "videoPath": "v"}),
        ))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(t.db.posts().list(10, 0).await.unwrap().is_empty());
}
