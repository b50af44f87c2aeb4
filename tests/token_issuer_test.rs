// ABOUTME: Tests for token issuance, refresh rotation, and Google ID token decoding
// ABOUTME: Validates claim sets, token_type enforcement, expiry, and signature rejection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use std::sync::Arc;
use transit_auth_server::crypto::SigningKeyPair;
use transit_auth_server::errors::AuthError;
use transit_auth_server::models::AuthenticatedPrincipal;
use transit_auth_server::tokens::{RefreshTokenClaims, TokenIssuer};
use uuid::Uuid;

const ISSUER: &str = "http://localhost:8090";
const AUDIENCE: &str = "mobile-app-client";

fn issuer() -> TokenIssuer {
    TokenIssuer::new(
        Arc::new(common::shared_test_key()),
        ISSUER.into(),
        AUDIENCE.into(),
    )
}

fn principal() -> AuthenticatedPrincipal {
    AuthenticatedPrincipal {
        user_id: 42,
        user_uuid: Uuid::new_v4(),
        email: "rider@example.com".into(),
        first_name: "Ada".into(),
        last_name: "Diouf".into(),
        role: "ROLE_USER".into(),
        authorities: vec!["ticket:read".into()],
    }
}

#[test]
fn test_issue_tokens_response_shape() {
    let issuer = issuer();
    let tokens = issuer.issue_tokens(&principal()).unwrap();

    assert_eq!(tokens.status, "success");
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, 3600);
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert!(!tokens.id_token.is_empty());
}

#[test]
fn test_access_token_claims() {
    let issuer = issuer();
    let principal = principal();
    let tokens = issuer.issue_tokens(&principal).unwrap();

    let claims = issuer.verify_access_token(&tokens.access_token).unwrap();
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.sub, principal.user_uuid.to_string());
    assert_eq!(claims.aud, AUDIENCE);
    assert_eq!(claims.scope, "openid profile email");
    assert_eq!(claims.authorities, "ROLE_USER,ticket:read");
    assert_eq!(claims.user_id, 42);
    assert!(claims.exp > Utc::now().timestamp());
    assert!(!claims.jti.is_empty());
}

#[test]
fn test_refresh_rotation_issues_fresh_triple() {
    let issuer = issuer();
    let original = issuer.issue_tokens(&principal()).unwrap();

    let rotated = issuer.refresh(&original.refresh_token).unwrap();
    assert_eq!(rotated.status, "success");

    // The rotated access token carries the same subject and authorities
    let before = issuer.verify_access_token(&original.access_token).unwrap();
    let after = issuer.verify_access_token(&rotated.access_token).unwrap();
    assert_eq!(before.sub, after.sub);
    assert_eq!(before.authorities, after.authorities);
    assert_eq!(before.user_id, after.user_id);

    // Rotation, not revocation: the old refresh token still works
    assert!(issuer.refresh(&original.refresh_token).is_ok());
}

#[test]
fn test_refresh_rejects_access_token() {
    let issuer = issuer();
    let tokens = issuer.issue_tokens(&principal()).unwrap();

    // An access token is well-signed but has no token_type=refresh claim
    let result = issuer.refresh(&tokens.access_token);
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken(_))));
}

#[test]
fn test_refresh_rejects_wrong_token_type_claim() {
    let keys = common::shared_test_key();
    let principal = principal();
    let now = Utc::now().timestamp();

    let claims = RefreshTokenClaims {
        iss: ISSUER.into(),
        sub: principal.user_uuid.to_string(),
        iat: now,
        exp: now + 600,
        jti: Uuid::new_v4().to_string(),
        token_type: "access".into(),
        user_id: principal.user_id,
        email: principal.email.clone(),
        given_name: principal.first_name.clone(),
        family_name: principal.last_name.clone(),
        role: principal.role.clone(),
        authorities: None,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(keys.kid.clone());
    let token = encode(&header, &claims, keys.encoding_key()).unwrap();

    let result = issuer().refresh(&token);
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken(_))));
}

#[test]
fn test_refresh_rejects_expired_token() {
    let keys = common::shared_test_key();
    let principal = principal();
    let now = Utc::now().timestamp();

    let claims = RefreshTokenClaims {
        iss: ISSUER.into(),
        sub: principal.user_uuid.to_string(),
        iat: now - 7_200,
        exp: now - 3_600, // well past any validation leeway
        jti: Uuid::new_v4().to_string(),
        token_type: "refresh".into(),
        user_id: principal.user_id,
        email: principal.email.clone(),
        given_name: principal.first_name.clone(),
        family_name: principal.last_name.clone(),
        role: principal.role.clone(),
        authorities: None,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(keys.kid.clone());
    let token = encode(&header, &claims, keys.encoding_key()).unwrap();

    let result = issuer().refresh(&token);
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken(_))));
}

#[test]
fn test_refresh_rejects_foreign_signature() {
    // Token minted by a different key pair entirely
    let foreign_keys = Arc::new(SigningKeyPair::generate_with_key_size("foreign-key", 2048).unwrap());
    let foreign_issuer = TokenIssuer::new(foreign_keys, ISSUER.into(), AUDIENCE.into());
    let tokens = foreign_issuer.issue_tokens(&principal()).unwrap();

    let result = issuer().refresh(&tokens.refresh_token);
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken(_))));
}

#[test]
fn test_refresh_preserves_snapshot_claims() {
    let issuer = issuer();
    let principal = principal();
    let tokens = issuer.issue_tokens(&principal).unwrap();

    // The refresh path rebuilds the principal from embedded claims only;
    // the ID token minted from it must carry the snapshot profile
    let rotated = issuer.refresh(&tokens.refresh_token).unwrap();
    let payload = decode_payload(&rotated.id_token);
    assert_eq!(payload["email"], "rider@example.com");
    assert_eq!(payload["given_name"], "Ada");
    assert_eq!(payload["family_name"], "Diouf");
    assert_eq!(payload["preferred_username"], "rider@example.com");
}

#[test]
fn test_decode_google_id_token_without_verification() {
    // Signature is garbage on purpose: decoding must not verify it
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        br#"{"sub":"google-sub-1","email":"rider@gmail.com","given_name":"Ada","family_name":"Diouf","picture":"https://example.com/p.jpg","name":"Ada Diouf"}"#,
    );
    let token = format!("{header}.{payload}.not-a-signature");

    let claims = issuer().decode_google_id_token(&token).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("google-sub-1"));
    assert_eq!(claims.email.as_deref(), Some("rider@gmail.com"));
    assert_eq!(claims.given_name.as_deref(), Some("Ada"));
    assert_eq!(claims.picture.as_deref(), Some("https://example.com/p.jpg"));
}

#[test]
fn test_decode_google_id_token_rejects_garbage() {
    let issuer = issuer();
    assert!(issuer.decode_google_id_token("not-a-jwt").is_err());
    assert!(issuer.decode_google_id_token("a.%%%.c").is_err());
}

fn decode_payload(token: &str) -> serde_json::Value {
    let payload = token.split('.').nth(1).unwrap();
    let bytes = URL_SAFE_NO_PAD.decode(payload).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
