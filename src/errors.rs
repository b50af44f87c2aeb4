// ABOUTME: Unified error taxonomy with HTTP status mapping and stable JSON error bodies
// ABOUTME: Credential failures map to generic user-facing messages, internals are logged only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! # Unified Error Handling
//!
//! Every failure surfaced by this service falls into one of the categories
//! below. The mobile API renders them as a stable JSON body
//! `{"status":"error","message":...}` with a status code reflecting the
//! category; browser handlers map them to localized page messages instead.
//! Internal detail (bcrypt errors, store failures, signature specifics) is
//! logged and never returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error taxonomy
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password (also used when the user does not exist,
    /// so the two cases are indistinguishable to a caller)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account locked after too many failed logins
    #[error("account locked")]
    AccountLocked,

    /// Account exists but has not been activated
    #[error("account disabled")]
    AccountDisabled,

    /// Account past its expiry date
    #[error("account expired")]
    AccountExpired,

    /// Submitted TOTP code did not match
    #[error("invalid second-factor code")]
    InvalidMfaCode,

    /// A second-factor code is required but was not submitted
    #[error("second-factor code required")]
    MfaRequired,

    /// Too many failed TOTP submissions; verification is paused
    #[error("second-factor verification locked")]
    MfaLocked,

    /// Refresh token failed signature, expiry, or `token_type` checks
    #[error("invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    /// Federated provider other than the supported ones
    #[error("unsupported federated provider: {0}")]
    UnsupportedProvider(String),

    /// Any lower-level failure while reconciling a federated identity
    #[error("federated identity processing failed")]
    FederatedProcessing(anyhow::Error),

    /// Request-level validation failure (message is field-specific and safe
    /// to show)
    #[error("{0}")]
    Validation(String),

    /// Resource conflict, e.g. registering an email that already exists
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected; detail goes to the log, not the wire
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl AuthError {
    /// HTTP status for this error category
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::InvalidMfaCode
            | Self::MfaRequired
            | Self::MfaLocked
            | Self::InvalidRefreshToken(_)
            | Self::FederatedProcessing(_) => StatusCode::UNAUTHORIZED,
            Self::AccountLocked | Self::AccountDisabled | Self::AccountExpired => {
                StatusCode::FORBIDDEN
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to a caller. Credential-adjacent categories
    /// collapse to generic text so responses cannot be used as an oracle.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Incorrect email or password".into(),
            Self::AccountLocked => "Account locked after too many attempts".into(),
            Self::AccountDisabled => "Account not activated. Check your email.".into(),
            Self::AccountExpired => "Account expired. Contact the administrator.".into(),
            Self::InvalidMfaCode => "Invalid code. Please try again.".into(),
            Self::MfaRequired => "A verification code is required".into(),
            Self::MfaLocked => "Too many attempts. Try again in a few minutes.".into(),
            Self::InvalidRefreshToken(_) => "Session expired. Please sign in again.".into(),
            Self::UnsupportedProvider(provider) => {
                format!("Sign-in provider {provider} is not supported")
            }
            Self::FederatedProcessing(_) => "Google sign-in failed".into(),
            Self::Validation(message) | Self::Conflict(message) => message.clone(),
            Self::Internal(_) => "An error occurred. Please try again.".into(),
        }
    }

    /// Wrap an unexpected failure
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Stable JSON error body returned by the mobile API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `"error"`
    pub status: String,
    /// Generic, user-presentable message
    pub message: String,
}

impl ErrorBody {
    /// Build the body for an error
    #[must_use]
    pub fn from_error(error: &AuthError) -> Self {
        Self {
            status: "error".into(),
            message: error.user_message(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_) | Self::FederatedProcessing(_)) {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (self.http_status(), Json(ErrorBody::from_error(&self))).into_response()
    }
}

/// Result type alias for handlers and services
pub type AuthResult<T> = Result<T, AuthError>;
