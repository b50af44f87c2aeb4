// ABOUTME: Authentication business logic shared by the browser and mobile surfaces
// ABOUTME: Credential validation, attempt bookkeeping, second-factor checks, registration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Authentication service
//!
//! Route handlers stay thin; the checks live here so the browser login page
//! and the mobile API share one implementation of credential validation,
//! account-state gating, and registration.

use crate::constants::limits::{MAX_LOGIN_ATTEMPTS, MIN_PASSWORD_LENGTH};
use crate::context::ServerContext;
use crate::errors::{AuthError, AuthResult};
use crate::models::UserRecord;
use crate::notifications::{publish_best_effort, Notification};
use crate::store::NewLocalUser;
use uuid::Uuid;

/// Validated registration input
#[derive(Debug, Clone)]
pub struct RegistrationData {
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Authentication business logic
pub struct AuthService;

impl AuthService {
    /// Validate email/password credentials and account state.
    ///
    /// On a wrong password the account's failed-login counter is
    /// incremented; on success it is reset and the last-login timestamp
    /// stamped. Account-state checks run before the password check so a
    /// locked account cannot be probed for its password.
    pub async fn authenticate_password(
        ctx: &ServerContext,
        email: &str,
        password: &str,
    ) -> AuthResult<UserRecord> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Email and password are required".into()));
        }

        tracing::info!(email, "login attempt");

        let user = ctx
            .users()
            .find_user_by_email(email)
            .await
            .map_err(AuthError::internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.account_non_locked || user.login_attempts >= MAX_LOGIN_ATTEMPTS {
            return Err(AuthError::AccountLocked);
        }
        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }
        if !user.account_non_expired {
            return Err(AuthError::AccountExpired);
        }

        // Federated-only accounts have no password to check
        let password_hash = user
            .password_hash
            .clone()
            .ok_or(AuthError::InvalidCredentials)?;

        // bcrypt verification is CPU-bound; keep it off the async executor
        let password = password.to_owned();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
                .await
                .map_err(|e| {
                    AuthError::internal(anyhow::anyhow!("password verification task failed: {e}"))
                })?
                .map_err(|e| {
                    AuthError::internal(anyhow::anyhow!("password verification error: {e}"))
                })?;

        if !is_valid {
            tracing::warn!(email, "invalid password");
            if let Err(e) = ctx.users().update_login_attempts(email).await {
                tracing::error!(error = %e, "failed to record login attempt");
            }
            return Err(AuthError::InvalidCredentials);
        }

        if let Err(e) = ctx.users().reset_login_attempts(user.user_uuid).await {
            tracing::warn!(error = %e, "failed to reset login attempts");
        }
        if let Err(e) = ctx.users().set_last_login(user.user_id).await {
            tracing::warn!(error = %e, "failed to update last login");
        }

        tracing::info!(email, user_id = user.user_id, "login successful");
        Ok(user)
    }

    /// Verify a submitted TOTP code for `user_uuid`, enforcing the attempt
    /// guard on both sides
    pub fn verify_mfa_code(
        ctx: &ServerContext,
        user_uuid: Uuid,
        secret: &str,
        code: &str,
    ) -> AuthResult<()> {
        ctx.mfa_guard().check_allowed(user_uuid)?;

        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InvalidMfaCode);
        }

        if ctx.mfa_verifier().verify(secret, code)? {
            ctx.mfa_guard().record_success(user_uuid);
            Ok(())
        } else {
            ctx.mfa_guard().record_failure(user_uuid);
            Err(AuthError::InvalidMfaCode)
        }
    }

    /// Register a local account and fire the verification-email event.
    ///
    /// Validation failures return before any user is created or any event
    /// published. The notification is fire-and-forget: a publish failure is
    /// logged, never surfaced.
    pub async fn register(ctx: &ServerContext, data: RegistrationData) -> AuthResult<()> {
        if data.email.trim().is_empty() {
            return Err(AuthError::Validation("Email is required".into()));
        }
        if data.password.is_empty() {
            return Err(AuthError::Validation("Password is required".into()));
        }
        if data.first_name.trim().is_empty() {
            return Err(AuthError::Validation("First name is required".into()));
        }
        if data.last_name.trim().is_empty() {
            return Err(AuthError::Validation("Last name is required".into()));
        }
        if let Some(confirm) = &data.confirm_password {
            if confirm != &data.password {
                return Err(AuthError::Validation("Passwords do not match".into()));
            }
        }
        if data.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".into(),
            ));
        }
        if !Self::is_valid_email(&data.email) {
            return Err(AuthError::Validation("Invalid email address".into()));
        }

        if ctx
            .users()
            .email_exists(&data.email)
            .await
            .map_err(AuthError::internal)?
        {
            return Err(AuthError::Conflict(
                "This email address is already in use".into(),
            ));
        }

        let password_hash = bcrypt::hash(&data.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AuthError::internal(anyhow::anyhow!("password hashing failed: {e}")))?;

        let verification_token = ctx
            .users()
            .create_local_user(NewLocalUser {
                email: data.email.clone(),
                first_name: data.first_name.clone(),
                last_name: data.last_name.clone(),
                phone: data.phone.clone(),
                password_hash,
            })
            .await
            .map_err(AuthError::internal)?;

        publish_best_effort(
            ctx.publisher(),
            &Notification::user_created(&verification_token, &data.first_name, &data.email),
        );

        tracing::info!(email = %data.email, "registration successful");
        Ok(())
    }

    /// Minimal email shape check
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        email[at_pos + 1..].contains('.')
    }
}
