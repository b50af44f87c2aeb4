// ABOUTME: In-memory UserStore implementation for tests and local development
// ABOUTME: DashMap keyed by user id with secondary lookups by email and Google id
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

use super::{NewFederatedUser, NewLocalUser, UserStore};
use crate::models::{AuthProvider, UserRecord};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// In-memory user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<i64, UserRecord>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed a user record directly (test setup)
    pub fn insert(&self, user: UserRecord) {
        self.next_id.fetch_max(user.user_id + 1, Ordering::Relaxed);
        self.users.insert(user.user_id, user);
    }

    /// Fetch a record by numeric id (test assertions)
    #[must_use]
    pub fn get(&self, user_id: i64) -> Option<UserRecord> {
        self.users.get(&user_id).map(|u| u.value().clone())
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone()))
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .map(|u| u.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn create_local_user(&self, user: NewLocalUser) -> Result<String> {
        let user_id = self.allocate_id();
        let record = UserRecord {
            user_id,
            user_uuid: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            password_hash: Some(user.password_hash),
            image_url: None,
            role: Some("USER".into()),
            authorities: None,
            mfa_enabled: false,
            mfa_secret: None,
            login_attempts: 0,
            // Local accounts start disabled until the email is verified
            enabled: false,
            account_non_expired: true,
            account_non_locked: true,
            google_id: None,
            auth_provider: AuthProvider::Local,
            last_login: None,
        };
        self.users.insert(user_id, record);
        Ok(Uuid::new_v4().to_string())
    }

    async fn create_oauth2_user(&self, user: NewFederatedUser) -> Result<UserRecord> {
        let user_id = self.allocate_id();
        let record = UserRecord {
            user_id,
            user_uuid: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: None,
            password_hash: None,
            image_url: user.image_url,
            role: Some("USER".into()),
            authorities: None,
            mfa_enabled: false,
            mfa_secret: None,
            login_attempts: 0,
            enabled: true,
            account_non_expired: true,
            account_non_locked: true,
            google_id: Some(user.google_id),
            auth_provider: AuthProvider::Google,
            last_login: None,
        };
        self.users.insert(user_id, record.clone());
        Ok(record)
    }

    async fn link_google_account(&self, user_id: i64, google_id: &str) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow!("user {user_id} not found"))?;
        user.google_id = Some(google_id.to_owned());
        user.auth_provider = AuthProvider::Google;
        Ok(())
    }

    async fn set_last_login(&self, user_id: i64) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_login_attempts(&self, email: &str) -> Result<()> {
        if let Some(mut user) = self
            .users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        {
            user.login_attempts += 1;
        }
        Ok(())
    }

    async fn reset_login_attempts(&self, user_uuid: Uuid) -> Result<()> {
        if let Some(mut user) = self.users.iter_mut().find(|u| u.user_uuid == user_uuid) {
            user.login_attempts = 0;
        }
        Ok(())
    }
}
