// ABOUTME: Federated identity reconciliation between provider claims and local user records
// ABOUTME: Find by provider id, link by email, or create - idempotent on repeated logins
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Federated identity resolution
//!
//! Each federated login arrives as transient provider claims. Resolution
//! locates the matching local user record:
//!
//! 1. By provider subject id - the common case on repeated logins.
//! 2. By email, when the account exists but was created locally: the
//!    federated id is linked to it. An account already linked to a
//!    different provider is used as-is, never silently re-linked.
//! 3. Otherwise a new auto-enabled record is created, defaulting missing
//!    names to the email local-part.

use crate::errors::{AuthError, AuthResult};
use crate::models::{AuthProvider, FederatedIdentity, UserRecord};
use crate::store::{NewFederatedUser, UserStore};
use std::sync::Arc;

/// Reconciles federated claims to a canonical local user record
pub struct FederatedIdentityResolver {
    store: Arc<dyn UserStore>,
}

impl FederatedIdentityResolver {
    /// Create a resolver over the persistence collaborator
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Resolve `identity` to a local user record, creating or linking as
    /// needed. Idempotent: repeated logins with the same provider subject
    /// id return the same record.
    pub async fn resolve(&self, identity: &FederatedIdentity) -> AuthResult<UserRecord> {
        if identity.provider != AuthProvider::Google {
            return Err(AuthError::UnsupportedProvider(
                identity.provider.as_str().to_owned(),
            ));
        }

        tracing::info!(
            email = %identity.email,
            provider_user_id = %identity.provider_user_id,
            "resolving federated identity"
        );

        if let Some(user) = self
            .store
            .find_user_by_google_id(&identity.provider_user_id)
            .await
            .map_err(AuthError::FederatedProcessing)?
        {
            tracing::debug!(email = %user.email, "found existing user by provider id");
            return Ok(user);
        }

        if let Some(user) = self
            .store
            .find_user_by_email(&identity.email)
            .await
            .map_err(AuthError::FederatedProcessing)?
        {
            return self.link_or_keep(user, identity).await;
        }

        self.create_user(identity).await
    }

    /// Link the federated id onto a local account, or keep an account
    /// already bound to another provider untouched
    async fn link_or_keep(
        &self,
        user: UserRecord,
        identity: &FederatedIdentity,
    ) -> AuthResult<UserRecord> {
        if user.auth_provider == AuthProvider::Local {
            tracing::info!(email = %user.email, "linking federated id to local account");
            self.store
                .link_google_account(user.user_id, &identity.provider_user_id)
                .await
                .map_err(AuthError::FederatedProcessing)?;

            // Re-read so the returned record reflects the link
            return self
                .store
                .find_user_by_google_id(&identity.provider_user_id)
                .await
                .map_err(AuthError::FederatedProcessing)?
                .ok_or_else(|| {
                    AuthError::FederatedProcessing(anyhow::anyhow!(
                        "user disappeared after linking federated account"
                    ))
                });
        }

        tracing::info!(
            email = %user.email,
            provider = user.auth_provider.as_str(),
            "account already bound to a provider; not re-linking"
        );
        Ok(user)
    }

    async fn create_user(&self, identity: &FederatedIdentity) -> AuthResult<UserRecord> {
        let local_part = identity.email.split('@').next().unwrap_or_default();
        let first_name = identity
            .given_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| local_part.to_owned());
        let family_name = identity.family_name.clone().unwrap_or_default();

        tracing::info!(email = %identity.email, "creating user from federated identity");
        self.store
            .create_oauth2_user(NewFederatedUser {
                email: identity.email.clone(),
                first_name,
                last_name: family_name,
                image_url: identity.picture_url.clone(),
                google_id: identity.provider_user_id.clone(),
            })
            .await
            .map_err(AuthError::FederatedProcessing)
    }
}
