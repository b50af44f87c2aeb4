// ABOUTME: Core domain models for users, principals, and federated identities
// ABOUTME: One tagged LoginSource union replaces per-login-path principal shapes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Domain models
//!
//! `UserRecord` is the persistence collaborator's view of a user, trimmed to
//! the fields this service reads. `AuthenticatedPrincipal` is the canonical
//! in-process representation of "who just logged in": every login path
//! (password, federated, post-MFA) normalizes into it through
//! [`AuthenticatedPrincipal::normalize`], so downstream token issuance never
//! inspects which path produced the authentication.

use crate::constants::roles;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity provider a user record is linked to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    /// Password account created locally
    Local,
    /// Google federated account
    Google,
}

impl AuthProvider {
    /// Provider name as stored by the persistence collaborator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Google => "GOOGLE",
        }
    }
}

/// User record as exposed by the persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Numeric user id
    pub user_id: i64,
    /// Opaque user UUID (token subject)
    pub user_uuid: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Bcrypt hash; absent for federated-only accounts
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    /// Role without any prefix convention enforced (e.g. "USER", "ROLE_ADMIN")
    pub role: Option<String>,
    /// Extra authorities as a comma-separated string
    pub authorities: Option<String>,
    /// Whether the user enrolled a TOTP second factor
    pub mfa_enabled: bool,
    /// Base32-encoded TOTP seed; consumed for verification only
    pub mfa_secret: Option<String>,
    pub login_attempts: i32,
    pub enabled: bool,
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub google_id: Option<String>,
    pub auth_provider: AuthProvider,
    pub last_login: Option<DateTime<Utc>>,
}

/// Which authentication path produced a successful login.
///
/// The original system carried a different principal type per path and
/// threaded them through a chain of type checks; collapsing the paths into
/// one tagged union keeps normalization in a single place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSource {
    /// Local email/password login
    Password,
    /// Federated login via the OAuth2 user-info flow
    FederatedOAuth2,
    /// Federated login via an OIDC id token
    FederatedOidc,
    /// Primary login previously succeeded; the second factor just confirmed
    MfaConfirmed,
}

/// Canonical representation of an authenticated user, independent of the
/// login path that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub user_id: i64,
    pub user_uuid: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `ROLE_`-prefixed primary authority
    pub role: String,
    /// Extra authorities beyond the role
    pub authorities: Vec<String>,
}

impl AuthenticatedPrincipal {
    /// Normalize a user record into the canonical principal shape.
    ///
    /// Invariant: the materialized `role` always carries the `ROLE_` prefix,
    /// whether or not the record's role string already had it; records with
    /// no role at all become `ROLE_USER`.
    #[must_use]
    pub fn normalize(user: &UserRecord, source: LoginSource) -> Self {
        tracing::debug!(
            email = %user.email,
            ?source,
            "normalizing authenticated principal"
        );

        let role = materialize_role(user.role.as_deref());
        let authorities = user
            .authorities
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            user_id: user.user_id,
            user_uuid: user.user_uuid,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role,
            authorities,
        }
    }

    /// Role plus extra authorities as the comma-joined claim value used in
    /// access and ID tokens
    #[must_use]
    pub fn authorities_claim(&self) -> String {
        if self.authorities.is_empty() {
            self.role.clone()
        } else {
            format!("{},{}", self.role, self.authorities.join(","))
        }
    }

    /// Display name used in ID-token profile claims
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Force the `ROLE_` prefix onto a role string, defaulting when absent
#[must_use]
pub fn materialize_role(role: Option<&str>) -> String {
    match role {
        Some(r) if r.starts_with(roles::ROLE_PREFIX) => r.to_owned(),
        Some(r) if !r.is_empty() => format!("{}{r}", roles::ROLE_PREFIX),
        _ => format!("{}{}", roles::ROLE_PREFIX, roles::DEFAULT_ROLE),
    }
}

/// Transient federated identity derived from provider claims on each login.
///
/// Never persisted as its own entity; only used to locate or create the
/// local user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Provider name, currently always "GOOGLE"
    pub provider: AuthProvider,
    /// Subject id asserted by the provider
    pub provider_user_id: String,
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture_url: Option<String>,
}
