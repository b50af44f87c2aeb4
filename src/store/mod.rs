// ABOUTME: Persistence collaborator trait for user record lookup and mutation
// ABOUTME: Narrow interface keyed by opaque ids; an in-memory implementation backs tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! User persistence collaborator
//!
//! The ticketing platform's persistence service owns user records; this
//! service reaches it only through the narrow [`UserStore`] trait below.
//! The in-memory implementation in [`memory`] serves tests and local
//! development.

pub mod memory;

use crate::models::UserRecord;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Input for creating a password-based account
#[derive(Debug, Clone)]
pub struct NewLocalUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Already bcrypt-hashed
    pub password_hash: String,
}

/// Input for creating a federated account (auto-enabled)
#[derive(Debug, Clone)]
pub struct NewFederatedUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
    pub google_id: String,
}

/// Narrow persistence interface consumed by the authentication service
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Look up a user by linked Google subject id
    async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<UserRecord>>;

    /// Whether any account uses this email
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Create a local (password) account; returns the email verification
    /// token minted by the persistence service
    async fn create_local_user(&self, user: NewLocalUser) -> Result<String>;

    /// Create a federated account, enabled immediately
    async fn create_oauth2_user(&self, user: NewFederatedUser) -> Result<UserRecord>;

    /// Attach a Google subject id to an existing account
    async fn link_google_account(&self, user_id: i64, google_id: &str) -> Result<()>;

    /// Stamp a successful login
    async fn set_last_login(&self, user_id: i64) -> Result<()>;

    /// Increment the failed-login counter for the account behind `email`
    async fn update_login_attempts(&self, email: &str) -> Result<()>;

    /// Reset the failed-login counter
    async fn reset_login_attempts(&self, user_uuid: Uuid) -> Result<()>;
}
