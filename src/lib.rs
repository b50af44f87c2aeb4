// ABOUTME: Main library entry point for the transit ticketing authentication server
// ABOUTME: Mobile OAuth2 bridging, token issuance, federated identity, and TOTP verification
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

#![deny(unsafe_code)]

//! # Transit Auth Server
//!
//! Authentication service for a transport-ticketing platform. Its job is the
//! part of login that HTTP redirects make hard: letting a mobile application
//! start a browser-mediated OAuth2 authorization-code flow, forcing a fresh
//! login (with an optional TOTP second factor) inside that browser, and
//! reuniting the mobile client with the in-flight authorization request
//! afterwards - plus a direct, non-browser token API for the same clients.
//!
//! ## Architecture
//!
//! - **Correlation store**: time-bounded token -> saved-URL map bridging the
//!   redirect sequence (read-once, five-minute TTL).
//! - **Authorize interceptor**: captures mobile `/oauth2/authorize` requests
//!   and forces a login, saving the URL through cache, session, and cookie.
//! - **Login completion bridge**: after any successful login, normalizes the
//!   principal and redirects back into the authorization flow.
//! - **Token issuer**: RS256 access/refresh/ID tokens with refresh rotation.
//! - **Federated identity resolver**: reconciles Google claims to local
//!   user records.
//! - **MFA verifier**: TOTP second factor with attempt limiting.
//!
//! Persistence and notification delivery are collaborators behind narrow
//! traits ([`store::UserStore`], [`notifications::NotificationPublisher`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transit_auth_server::config::ServerConfig;
//! use transit_auth_server::context::ServerContext;
//! use transit_auth_server::crypto::SigningKeyPair;
//! use transit_auth_server::notifications::LoggingPublisher;
//! use transit_auth_server::store::memory::InMemoryUserStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ServerConfig::from_env()?;
//! let keys = SigningKeyPair::generate("key-1")?;
//! let ctx = ServerContext::new(
//!     config,
//!     keys,
//!     Arc::new(InMemoryUserStore::new()),
//!     Arc::new(LoggingPublisher),
//! )?;
//! let app = transit_auth_server::routes::router(ctx);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

/// Login completion bridge
pub mod bridge;

/// Environment-based configuration
pub mod config;

/// Application constants grouped by domain
pub mod constants;

/// Shared server context (dependency injection)
pub mod context;

/// Correlation token store
pub mod correlation;

/// Cryptographic key management
pub mod crypto;

/// Unified error handling
pub mod errors;

/// Federated identity resolution
pub mod federation;

/// Logging configuration
pub mod logging;

/// Second-factor (TOTP) verification
pub mod mfa;

/// Request middleware, including the authorize interceptor
pub mod middleware;

/// Domain models
pub mod models;

/// Notification publishing seam
pub mod notifications;

/// HTTP routes
pub mod routes;

/// In-process session store
pub mod session;

/// User persistence collaborator interface
pub mod store;

/// Token issuance and verification
pub mod tokens;
