// ABOUTME: Application constants grouped by domain
// ABOUTME: Wire-level names, token lifetimes, and second-factor limits
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! flat list. Wire-level names (cookies, query parameters, session keys) are
//! load-bearing: the mobile application and browser both depend on them.

/// Mobile authorization-bridge wire names
pub mod mobile {
    /// Default client id the mobile application authenticates as
    pub const CLIENT_ID: &str = "mobile-app-client";

    /// Cookie carrying the saved authorization URL (URL-encoded value)
    pub const AUTH_URL_COOKIE: &str = "MOBILE_OAUTH_URL";

    /// Cookie marking that the browser login just finished
    pub const LOGIN_DONE_COOKIE: &str = "MOBILE_LOGIN_DONE";

    /// Query parameter and cookie carrying the correlation token
    pub const AUTH_TOKEN_PARAM: &str = "mobile_auth_token";

    /// Session attribute holding the saved authorization URL
    pub const AUTH_URL_SESSION_KEY: &str = "MOBILE_OAUTH_URL_SESSION";

    /// Session attribute marking that the browser login just finished
    pub const LOGIN_DONE_SESSION_KEY: &str = "MOBILE_LOGIN_DONE_SESSION";

    /// Session attribute holding the upstream framework's saved request URL
    pub const SAVED_REQUEST_SESSION_KEY: &str = "SAVED_REQUEST";
}

/// Lifetimes for correlation state and cookies, in seconds
pub mod limits {
    /// How long a captured authorization URL stays resolvable (5 minutes)
    pub const CORRELATION_TTL_SECS: u64 = 300;

    /// Max-age of the URL and token fallback cookies
    pub const AUTH_COOKIE_MAX_AGE_SECS: i64 = 300;

    /// Max-age of the "login just completed" marker cookie
    pub const LOGIN_DONE_COOKIE_MAX_AGE_SECS: i64 = 60;

    /// Failed TOTP submissions tolerated before the verifier locks
    pub const MFA_MAX_FAILED_ATTEMPTS: u32 = 5;

    /// How long a locked user waits before TOTP verification resumes
    pub const MFA_LOCKOUT_SECS: i64 = 300;

    /// Minimum accepted password length at registration
    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Consecutive failed logins before an account counts as locked
    pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
}

/// Token lifetimes and fixed claim values
pub mod tokens {
    /// Access token lifetime (1 hour)
    pub const ACCESS_TOKEN_TTL_SECS: i64 = 3_600;

    /// Refresh token lifetime (30 days)
    pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3_600;

    /// ID token lifetime (30 minutes)
    pub const ID_TOKEN_TTL_SECS: i64 = 30 * 60;

    /// Scope embedded in every access token
    pub const ACCESS_TOKEN_SCOPE: &str = "openid profile email";

    /// `token_type` claim value that marks a refresh token
    pub const REFRESH_TOKEN_TYPE: &str = "refresh";
}

/// Session cookie configuration and well-known attribute keys
pub mod session {
    /// Cookie carrying the in-process session id
    pub const SESSION_COOKIE: &str = "SESSION";

    /// One-shot error message shown on the next page render
    pub const FLASH_ERROR_KEY: &str = "FLASH_ERROR";

    /// One-shot success message shown on the next page render
    pub const FLASH_SUCCESS_KEY: &str = "FLASH_SUCCESS";
}

/// Default role material
pub mod roles {
    /// Prefix every exposed authority must carry
    pub const ROLE_PREFIX: &str = "ROLE_";

    /// Fallback role when a user record carries none
    pub const DEFAULT_ROLE: &str = "USER";
}
