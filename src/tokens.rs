// ABOUTME: RS256 token issuance - access, refresh, and ID tokens for mobile clients
// ABOUTME: Refresh rotation re-issues from embedded claims; Google ID tokens are decoded unverified
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Token issuance and verification
//!
//! Three token kinds, all RS256-signed with the process key pair and a `kid`
//! header:
//!
//! - **Access** (1 h): subject is the user UUID, audience is the mobile
//!   client, carries scope/authorities/user ids.
//! - **Refresh** (30 d): a self-contained snapshot of the user at mint time.
//!   There is no server-side refresh store; [`TokenIssuer::refresh`] rebuilds
//!   the principal from the embedded claims and issues a fresh triple. The
//!   old refresh token stays valid until its own expiry (rotation, not
//!   revocation), so role changes take up to 30 days to propagate.
//! - **ID** (30 min): OpenID-style profile claims for the mobile client.
//!
//! [`TokenIssuer::decode_google_id_token`] extracts claims WITHOUT verifying
//! the signature: the client-side Google SDK already validated the token.
//! That trust boundary is deliberate and documented, not an oversight.

use crate::constants::tokens::{
    ACCESS_TOKEN_SCOPE, ACCESS_TOKEN_TTL_SECS, ID_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS,
    REFRESH_TOKEN_TYPE,
};
use crate::crypto::SigningKeyPair;
use crate::errors::{AuthError, AuthResult};
use crate::models::{materialize_role, AuthenticatedPrincipal};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    /// User UUID
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub scope: String,
    /// Comma-joined role + extra authorities
    pub authorities: String,
    pub user_id: i64,
    pub user_uuid: String,
}

/// Refresh token claims - a full snapshot of the user at mint time
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub iss: String,
    /// User UUID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorities: Option<String>,
}

/// ID token claims (OpenID-style profile)
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    /// Numeric user id
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub preferred_username: String,
    pub authorities: String,
}

/// Claims extracted from a Google ID token (signature NOT verified)
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Token triple returned to mobile clients
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Always `"success"`
    pub status: String,
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    /// Always `"Bearer"`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Mints, verifies, and rotates signed tokens for mobile clients
pub struct TokenIssuer {
    keys: Arc<SigningKeyPair>,
    issuer: String,
    /// Audience for access and ID tokens
    audience: String,
}

impl TokenIssuer {
    /// Create an issuer over the process signing key pair
    #[must_use]
    pub fn new(keys: Arc<SigningKeyPair>, issuer: String, audience: String) -> Self {
        Self {
            keys,
            issuer,
            audience,
        }
    }

    /// Issue the access/refresh/id triple for an authenticated principal
    pub fn issue_tokens(&self, principal: &AuthenticatedPrincipal) -> AuthResult<TokenResponse> {
        let now = Utc::now();

        let access_token = self.issue_access_token(principal, now.timestamp())?;
        let refresh_token = self.issue_refresh_token(principal, now.timestamp())?;
        let id_token = self.issue_id_token(principal, now.timestamp())?;

        Ok(TokenResponse {
            status: "success".into(),
            access_token,
            refresh_token,
            id_token,
            token_type: "Bearer".into(),
            expires_in: ACCESS_TOKEN_TTL_SECS,
        })
    }

    /// Rotate a refresh token: verify it, rebuild the principal from its
    /// embedded claims, and issue a fresh triple.
    ///
    /// The old token is not invalidated; it remains usable until its own
    /// expiry.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let claims = self.verify_refresh_token(refresh_token)?;

        let user_uuid = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidRefreshToken("subject is not a UUID".into()))?;

        // Rebuild the principal from the snapshot; no store round-trip
        let principal = AuthenticatedPrincipal {
            user_id: claims.user_id,
            user_uuid,
            email: claims.email,
            first_name: claims.given_name,
            last_name: claims.family_name,
            role: materialize_role(Some(&claims.role)),
            authorities: claims
                .authorities
                .as_deref()
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        };

        tracing::info!(user_uuid = %principal.user_uuid, "refresh token rotated");
        self.issue_tokens(&principal)
    }

    /// Verify an access token's signature, expiry, and audience
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.audience.as_str()]);

        decode::<AccessTokenClaims>(token, self.keys.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "access token validation failed");
                AuthError::InvalidCredentials
            })
    }

    /// Extract claims from a Google ID token without verifying its
    /// signature.
    ///
    /// The mobile SDK validated the token against Google's keys before
    /// handing it over; this side only needs the profile claims. Malformed
    /// tokens are still rejected.
    pub fn decode_google_id_token(&self, id_token: &str) -> AuthResult<GoogleIdClaims> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::Validation("Invalid Google token".into()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Validation("Invalid Google token".into()))?;

        serde_json::from_slice(&bytes)
            .map_err(|_| AuthError::Validation("Invalid Google token".into()))
    }

    fn verify_refresh_token(&self, token: &str) -> AuthResult<RefreshTokenClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        // Refresh tokens carry no audience restriction
        validation.validate_aud = false;

        let claims = decode::<RefreshTokenClaims>(token, self.keys.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "expired",
                    ErrorKind::InvalidSignature => "signature verification failed",
                    _ => "malformed",
                };
                tracing::warn!(error = %e, "refresh token rejected");
                AuthError::InvalidRefreshToken(reason.into())
            })?;

        if claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(AuthError::InvalidRefreshToken(format!(
                "token_type is {:?}, not refresh",
                claims.token_type
            )));
        }

        Ok(claims)
    }

    fn issue_access_token(
        &self,
        principal: &AuthenticatedPrincipal,
        now: i64,
    ) -> AuthResult<String> {
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: principal.user_uuid.to_string(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
            scope: ACCESS_TOKEN_SCOPE.into(),
            authorities: principal.authorities_claim(),
            user_id: principal.user_id,
            user_uuid: principal.user_uuid.to_string(),
        };
        self.sign(&claims)
    }

    fn issue_refresh_token(
        &self,
        principal: &AuthenticatedPrincipal,
        now: i64,
    ) -> AuthResult<String> {
        let claims = RefreshTokenClaims {
            iss: self.issuer.clone(),
            sub: principal.user_uuid.to_string(),
            iat: now,
            exp: now + REFRESH_TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
            token_type: REFRESH_TOKEN_TYPE.into(),
            user_id: principal.user_id,
            email: principal.email.clone(),
            given_name: principal.first_name.clone(),
            family_name: principal.last_name.clone(),
            role: principal.role.clone(),
            authorities: (!principal.authorities.is_empty())
                .then(|| principal.authorities.join(",")),
        };
        self.sign(&claims)
    }

    fn issue_id_token(&self, principal: &AuthenticatedPrincipal, now: i64) -> AuthResult<String> {
        let claims = IdTokenClaims {
            iss: self.issuer.clone(),
            sub: principal.user_id.to_string(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + ID_TOKEN_TTL_SECS,
            jti: Uuid::new_v4().to_string(),
            name: principal.full_name(),
            given_name: principal.first_name.clone(),
            family_name: principal.last_name.clone(),
            email: principal.email.clone(),
            preferred_username: principal.email.clone(),
            authorities: principal.authorities_claim(),
        };
        self.sign(&claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AuthResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.keys.kid.clone());
        encode(&header, claims, self.keys.encoding_key())
            .map_err(|e| AuthError::internal(anyhow::anyhow!("token signing failed: {e}")))
    }
}
