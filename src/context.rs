// ABOUTME: Server context carrying the injected components shared by all handlers
// ABOUTME: Built once at startup; everything inside is Arc-shared and immutable or thread-safe
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Server context
//!
//! One explicitly constructed context replaces process-wide statics: the
//! correlation store, session store, token issuer, and collaborator handles
//! are created at service start and injected into the router as axum state.

use crate::bridge::LoginCompletionBridge;
use crate::config::ServerConfig;
use crate::correlation::CorrelationStore;
use crate::crypto::SigningKeyPair;
use crate::federation::FederatedIdentityResolver;
use crate::mfa::{MfaAttemptGuard, MfaVerifier};
use crate::notifications::NotificationPublisher;
use crate::session::SessionStore;
use crate::store::UserStore;
use crate::tokens::TokenIssuer;
use anyhow::Result;
use std::sync::Arc;

/// Shared server state
#[derive(Clone)]
pub struct ServerContext {
    config: Arc<ServerConfig>,
    correlation: Arc<CorrelationStore>,
    sessions: Arc<SessionStore>,
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenIssuer>,
    resolver: Arc<FederatedIdentityResolver>,
    mfa_verifier: MfaVerifier,
    mfa_guard: Arc<MfaAttemptGuard>,
    publisher: Arc<dyn NotificationPublisher>,
    bridge: Arc<LoginCompletionBridge>,
}

impl ServerContext {
    /// Assemble the context from configuration, key material, and the
    /// collaborator implementations
    ///
    /// # Errors
    /// Returns an error if key material is unusable
    pub fn new(
        config: ServerConfig,
        keys: SigningKeyPair,
        users: Arc<dyn UserStore>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let keys = Arc::new(keys);
        let correlation = Arc::new(CorrelationStore::new());
        let sessions = Arc::new(SessionStore::new());

        let tokens = Arc::new(TokenIssuer::new(
            keys,
            config.token_issuer.clone(),
            config.mobile_client_id.clone(),
        ));
        let resolver = Arc::new(FederatedIdentityResolver::new(Arc::clone(&users)));
        let bridge = Arc::new(LoginCompletionBridge::new(
            Arc::clone(&correlation),
            Arc::clone(&sessions),
            config.default_app_url.clone(),
        ));

        Ok(Self {
            config,
            correlation,
            sessions,
            users,
            tokens,
            resolver,
            mfa_verifier: MfaVerifier::new(),
            mfa_guard: Arc::new(MfaAttemptGuard::new()),
            publisher,
            bridge,
        })
    }

    /// Server configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Correlation token store
    #[must_use]
    pub fn correlation(&self) -> &CorrelationStore {
        &self.correlation
    }

    /// Session store
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Persistence collaborator
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Token issuer
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Federated identity resolver
    #[must_use]
    pub fn resolver(&self) -> &FederatedIdentityResolver {
        &self.resolver
    }

    /// Stateless TOTP verifier
    #[must_use]
    pub const fn mfa_verifier(&self) -> &MfaVerifier {
        &self.mfa_verifier
    }

    /// Second-factor attempt guard
    #[must_use]
    pub fn mfa_guard(&self) -> &MfaAttemptGuard {
        &self.mfa_guard
    }

    /// Notification transport
    #[must_use]
    pub fn publisher(&self) -> &dyn NotificationPublisher {
        self.publisher.as_ref()
    }

    /// Login completion bridge
    #[must_use]
    pub fn bridge(&self) -> &LoginCompletionBridge {
        &self.bridge
    }
}
