// ABOUTME: Mobile-facing authentication API - token, register, google, refresh
// ABOUTME: Direct non-browser path: credentials or a Google ID token straight to a token triple
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Mobile authentication API
//!
//! The mobile application talks JSON to `/api/auth/*` and never sees the
//! browser bridge. Success responses carry the access/refresh/id token
//! triple; failures carry the stable `{"status":"error","message":...}`
//! body with a status code for the category.

use crate::context::ServerContext;
use crate::errors::{AuthError, AuthResult};
use crate::models::{AuthProvider, AuthenticatedPrincipal, FederatedIdentity, LoginSource};
use crate::routes::auth::{AuthService, RegistrationData};
use crate::tokens::TokenResponse;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

/// Mobile API route definitions
pub fn routes() -> Router<ServerContext> {
    Router::new()
        .route("/api/auth/token", post(token))
        .route("/api/auth/register", post(register))
        .route("/api/auth/google", post(google_login))
        .route("/api/auth/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    /// TOTP code, required when the account has a second factor enrolled
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    confirm_password: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleLoginRequest {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// POST /api/auth/token - direct email/password login
async fn token(
    State(ctx): State<ServerContext>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let email = non_blank(request.email.as_deref())
        .ok_or_else(|| AuthError::Validation("Email and password are required".into()))?;
    let password = non_blank(request.password.as_deref())
        .ok_or_else(|| AuthError::Validation("Email and password are required".into()))?;

    let user = AuthService::authenticate_password(&ctx, email, password).await?;

    let source = if user.mfa_enabled && user.mfa_secret.is_some() {
        let code = non_blank(request.code.as_deref()).ok_or(AuthError::MfaRequired)?;
        let secret = user
            .mfa_secret
            .as_deref()
            .ok_or_else(|| AuthError::internal(anyhow::anyhow!("MFA enabled without seed")))?;
        AuthService::verify_mfa_code(&ctx, user.user_uuid, secret, code)?;
        LoginSource::MfaConfirmed
    } else {
        LoginSource::Password
    };

    let principal = AuthenticatedPrincipal::normalize(&user, source);
    let tokens = ctx.tokens().issue_tokens(&principal)?;

    tracing::info!(email, "mobile login successful");
    Ok(Json(tokens))
}

/// POST /api/auth/register - in-app registration
async fn register(
    State(ctx): State<ServerContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    let data = RegistrationData {
        email: request.email.unwrap_or_default(),
        password: request.password.unwrap_or_default(),
        confirm_password: request.confirm_password,
        first_name: request.first_name.unwrap_or_default(),
        last_name: request.last_name.unwrap_or_default(),
        phone: request.phone,
    };

    AuthService::register(&ctx, data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Account created. Check your email to activate your account.",
        })),
    )
        .into_response())
}

/// POST /api/auth/google - exchange a Google ID token for the app's tokens
async fn google_login(
    State(ctx): State<ServerContext>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let id_token = non_blank(request.id_token.as_deref())
        .ok_or_else(|| AuthError::Validation("Google ID token is required".into()))?;

    let identity = federated_identity_from_token(&ctx, id_token)?;
    let user = ctx.resolver().resolve(&identity).await?;

    if let Err(e) = ctx.users().set_last_login(user.user_id).await {
        tracing::warn!(error = %e, "failed to update last login");
    }

    let principal = AuthenticatedPrincipal::normalize(&user, LoginSource::FederatedOidc);
    let tokens = ctx.tokens().issue_tokens(&principal)?;

    tracing::info!(email = %user.email, "mobile Google login successful");
    Ok(Json(tokens))
}

/// POST /api/auth/refresh - rotate a refresh token
async fn refresh(
    State(ctx): State<ServerContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let refresh_token = non_blank(request.refresh_token.as_deref())
        .ok_or_else(|| AuthError::Validation("Refresh token is required".into()))?;

    let tokens = ctx.tokens().refresh(refresh_token)?;
    Ok(Json(tokens))
}

/// Decode the (client-validated) Google ID token into a federated identity
fn federated_identity_from_token(
    ctx: &ServerContext,
    id_token: &str,
) -> AuthResult<FederatedIdentity> {
    let claims = ctx.tokens().decode_google_id_token(id_token)?;

    let provider_user_id = claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::Validation("Invalid Google token".into()))?;
    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::Validation("Invalid Google token".into()))?;

    Ok(FederatedIdentity {
        provider: AuthProvider::Google,
        provider_user_id,
        email,
        given_name: claims.given_name,
        family_name: claims.family_name,
        picture_url: claims.picture,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
