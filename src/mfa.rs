// ABOUTME: TOTP second-factor verification with per-user attempt limiting
// ABOUTME: Stateless RFC 6238 check plus a lockout guard shared by browser and mobile paths
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Second-factor (TOTP) verification
//!
//! [`MfaVerifier`] is the stateless check: SHA-1, 6 digits, 30-second step,
//! one step of drift tolerance either way, against a base32-encoded per-user
//! seed owned by the persistence collaborator. This service only consumes
//! the seed, never stores or rotates it.
//!
//! [`MfaAttemptGuard`] bounds guessing: five consecutive failures lock
//! verification for that user for five minutes. The counter resets on
//! success.

use crate::constants::limits::{MFA_LOCKOUT_SECS, MFA_MAX_FAILED_ATTEMPTS};
use crate::errors::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use totp_rs::{Algorithm, Secret, TOTP};
use uuid::Uuid;

/// TOTP digit count
const TOTP_DIGITS: usize = 6;
/// Accepted drift, in 30-second steps, on either side of now
const TOTP_SKEW: u8 = 1;
/// TOTP time step in seconds
const TOTP_STEP_SECS: u64 = 30;

/// Stateless TOTP verification
#[derive(Debug, Clone, Copy, Default)]
pub struct MfaVerifier;

impl MfaVerifier {
    /// Create a verifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Check `code` against the base32-encoded `secret` for the current
    /// time step, tolerating one step of clock drift either way.
    ///
    /// Returns `Ok(false)` for a well-formed but wrong code; malformed
    /// secrets are an internal error because they indicate corrupt seed
    /// material, not user input.
    pub fn verify(&self, secret: &str, code: &str) -> AuthResult<bool> {
        let secret_bytes = Secret::Encoded(secret.to_owned())
            .to_bytes()
            .map_err(|e| AuthError::internal(anyhow::anyhow!("malformed TOTP secret: {e:?}")))?;

        let totp = TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP_SECS,
            secret_bytes,
            None,          // No issuer needed for verification
            String::new(), // No account name needed for verification
        )
        .map_err(|e| AuthError::internal(anyhow::anyhow!("TOTP creation failed: {e}")))?;

        Ok(totp.check_current(code).unwrap_or(false))
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptState {
    failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Per-user failure counter for second-factor submissions.
///
/// Independent of the primary-login attempt counter: knowing the password
/// must not buy unlimited TOTP guesses.
#[derive(Debug, Default)]
pub struct MfaAttemptGuard {
    attempts: DashMap<Uuid, AttemptState>,
}

impl MfaAttemptGuard {
    /// Create an empty guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail fast when the user is inside a lockout window
    pub fn check_allowed(&self, user_uuid: Uuid) -> AuthResult<()> {
        if let Some(state) = self.attempts.get(&user_uuid) {
            if let Some(until) = state.locked_until {
                if Utc::now() < until {
                    return Err(AuthError::MfaLocked);
                }
            }
        }
        Ok(())
    }

    /// Record a failed submission; the fifth consecutive failure starts a
    /// five-minute lockout
    pub fn record_failure(&self, user_uuid: Uuid) {
        let mut state = self.attempts.entry(user_uuid).or_insert(AttemptState {
            failures: 0,
            locked_until: None,
        });
        state.failures += 1;
        if state.failures >= MFA_MAX_FAILED_ATTEMPTS {
            state.locked_until = Some(Utc::now() + Duration::seconds(MFA_LOCKOUT_SECS));
            state.failures = 0;
            tracing::warn!(%user_uuid, "second-factor verification locked");
        }
    }

    /// Reset the counter after a successful verification
    pub fn record_success(&self, user_uuid: Uuid) {
        self.attempts.remove(&user_uuid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4648 base32 of a 20-byte seed
    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn current_code(secret: &str) -> String {
        let totp = TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP_SECS,
            Secret::Encoded(secret.to_owned()).to_bytes().unwrap(),
            None,
            String::new(),
        )
        .unwrap();
        totp.generate_current().unwrap()
    }

    #[test]
    fn test_accepts_code_from_correct_secret() {
        let verifier = MfaVerifier::new();
        let code = current_code(SECRET);
        assert!(verifier.verify(SECRET, &code).unwrap());
    }

    #[test]
    fn test_rejects_code_from_different_secret() {
        let verifier = MfaVerifier::new();
        let other = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
        let code = current_code(other);
        // Collision probability is 1e-6 per step; tolerate it by checking
        // the codes actually differ before asserting rejection.
        if code != current_code(SECRET) {
            assert!(!verifier.verify(SECRET, &code).unwrap());
        }
    }

    #[test]
    fn test_rejects_malformed_secret() {
        let verifier = MfaVerifier::new();
        assert!(verifier.verify("not-base32-!!!", "123456").is_err());
    }

    #[test]
    fn test_guard_locks_after_max_failures() {
        let guard = MfaAttemptGuard::new();
        let user = Uuid::new_v4();

        for _ in 0..MFA_MAX_FAILED_ATTEMPTS {
            guard.check_allowed(user).unwrap();
            guard.record_failure(user);
        }
        assert!(matches!(
            guard.check_allowed(user),
            Err(AuthError::MfaLocked)
        ));
    }

    #[test]
    fn test_guard_resets_on_success() {
        let guard = MfaAttemptGuard::new();
        let user = Uuid::new_v4();

        for _ in 0..MFA_MAX_FAILED_ATTEMPTS - 1 {
            guard.record_failure(user);
        }
        guard.record_success(user);
        for _ in 0..MFA_MAX_FAILED_ATTEMPTS - 1 {
            guard.record_failure(user);
        }
        guard.check_allowed(user).unwrap();
    }
}
