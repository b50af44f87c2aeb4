// ABOUTME: Integration tests for the mobile authentication API
// ABOUTME: Exercises /api/auth/token, /register, /google, and /refresh through the router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::json;
use tower::ServiceExt;
use transit_auth_server::store::UserStore;

const MFA_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn jwt_payload(token: &str) -> serde_json::Value {
    let payload = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

fn current_totp_code(secret: &str) -> String {
    let totp = totp_rs::TOTP::new(
        totp_rs::Algorithm::SHA1,
        6,
        1,
        30,
        totp_rs::Secret::Encoded(secret.to_owned()).to_bytes().unwrap(),
        None,
        String::new(),
    )
    .unwrap();
    totp.generate_current().unwrap()
}

#[tokio::test]
async fn test_password_login_returns_token_triple() {
    let harness = common::test_harness();
    common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let access = body["access_token"].as_str().unwrap();
    let claims = harness.ctx.tokens().verify_access_token(access).unwrap();
    assert_eq!(claims.user_id, 1);
    assert_eq!(claims.authorities, "ROLE_USER");
}

#[tokio::test]
async fn test_wrong_password_returns_401_and_counts_attempt() {
    let harness = common::test_harness();
    common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "wrong-password"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Incorrect email or password");

    assert_eq!(harness.store.get(1).unwrap().login_attempts, 1);
}

#[tokio::test]
async fn test_missing_credentials_return_400() {
    let harness = common::test_harness();

    let response = harness
        .app
        .clone()
        .oneshot(json_request("/api/auth/token", json!({"email": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_locked_account_returns_403() {
    let harness = common::test_harness();
    let mut user = common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");
    user.login_attempts = 5;
    harness.store.insert(user);

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Account locked after too many attempts");
}

#[tokio::test]
async fn test_disabled_account_returns_403() {
    let harness = common::test_harness();
    let mut user = common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");
    user.enabled = false;
    harness.store.insert(user);

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mfa_user_requires_code() {
    let harness = common::test_harness();
    let mut user = common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");
    user.mfa_enabled = true;
    user.mfa_secret = Some(MFA_SECRET.into());
    harness.store.insert(user);

    // Without a code: rejected after the password check
    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "A verification code is required");

    // With the current TOTP code: token triple issued
    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({
                "email": "rider@example.com",
                "password": "password123",
                "code": current_totp_code(MFA_SECRET),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_creates_user_and_publishes_event() {
    let harness = common::test_harness();

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({
                "email": "new.rider@example.com",
                "password": "password123",
                "confirmPassword": "password123",
                "firstName": "Ada",
                "lastName": "Diouf",
                "phone": "+221770000000",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "success");

    assert!(harness
        .store
        .find_user_by_email("new.rider@example.com")
        .await
        .unwrap()
        .is_some());

    let events = harness.publisher.published();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].payload.data.get("email").map(String::as_str),
        Some("new.rider@example.com")
    );
    assert!(events[0].payload.data.contains_key("token"));
}

#[tokio::test]
async fn test_register_short_password_creates_nothing() {
    let harness = common::test_harness();

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({
                "email": "new.rider@example.com",
                "password": "short",
                "firstName": "Ada",
                "lastName": "Diouf",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Password must be at least 8 characters");

    // No user created, no event published
    assert!(!harness
        .store
        .email_exists("new.rider@example.com")
        .await
        .unwrap());
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn test_register_duplicate_email_returns_409() {
    let harness = common::test_harness();
    common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            json!({
                "email": "rider@example.com",
                "password": "password123",
                "firstName": "Ada",
                "lastName": "Diouf",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_google_login_is_idempotent() {
    let harness = common::test_harness();

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        br#"{"sub":"google-sub-7","email":"rider@gmail.com","given_name":"Ada","family_name":"Diouf"}"#,
    );
    let id_token = format!("{header}.{payload}.client-validated");

    let first = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/google",
            json!({"idToken": id_token}),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = common::body_json(first).await;

    let second = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/google",
            json!({"idToken": id_token}),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = common::body_json(second).await;

    // Both logins resolve to the same local user
    let first_claims = jwt_payload(first_body["access_token"].as_str().unwrap());
    let second_claims = jwt_payload(second_body["access_token"].as_str().unwrap());
    assert_eq!(first_claims["user_uuid"], second_claims["user_uuid"]);
}

#[tokio::test]
async fn test_google_login_rejects_missing_token() {
    let harness = common::test_harness();

    let response = harness
        .app
        .clone()
        .oneshot(json_request("/api/auth/google", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_roundtrip() {
    let harness = common::test_harness();
    common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");

    let login = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();
    let login_body = common::body_json(login).await;
    let refresh_token = login_body["refresh_token"].as_str().unwrap();

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/refresh",
            json!({"refreshToken": refresh_token}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "success");
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_refresh_with_tampered_signature_returns_401() {
    let harness = common::test_harness();
    common::seed_password_user(&harness.store, 1, "rider@example.com", "password123");

    let login = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/token",
            json!({"email": "rider@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();
    let login_body = common::body_json(login).await;
    let refresh_token = login_body["refresh_token"].as_str().unwrap();

    // Flip the final signature character
    let mut tampered = refresh_token.to_owned();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = harness
        .app
        .clone()
        .oneshot(json_request(
            "/api/auth/refresh",
            json!({"refreshToken": tampered}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Session expired. Please sign in again.");
    assert!(body.get("access_token").is_none());
}
