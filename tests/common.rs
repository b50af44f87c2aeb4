// ABOUTME: Shared test helpers - context assembly, seeded users, cookie plumbing
// ABOUTME: One RSA test key is generated per test binary and re-imported per context
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code)]

use anyhow::Result;
use axum::response::Response;
use axum::Router;
use std::sync::{Arc, Mutex, OnceLock};
use transit_auth_server::config::ServerConfig;
use transit_auth_server::context::ServerContext;
use transit_auth_server::crypto::SigningKeyPair;
use transit_auth_server::models::{AuthProvider, UserRecord};
use transit_auth_server::notifications::{Notification, NotificationPublisher};
use transit_auth_server::routes;
use transit_auth_server::store::memory::InMemoryUserStore;
use uuid::Uuid;

/// Low bcrypt cost keeps test logins fast; strength is irrelevant here
pub const TEST_BCRYPT_COST: u32 = 4;

static TEST_KEY_PEM: OnceLock<String> = OnceLock::new();

/// RSA key generation is slow; generate one pair per test binary and
/// re-import it for each context
pub fn shared_test_key() -> SigningKeyPair {
    let pem = TEST_KEY_PEM.get_or_init(|| {
        SigningKeyPair::generate_with_key_size("test-key", 2048)
            .unwrap()
            .export_private_key_pem()
            .to_owned()
    });
    SigningKeyPair::import_private_key_pem("test-key", pem).unwrap()
}

/// Publisher that records instead of delivering
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<Notification>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationPublisher for RecordingPublisher {
    fn publish(&self, notification: &Notification) -> Result<()> {
        self.events.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Assembled test server with handles to its collaborators
pub struct TestHarness {
    pub ctx: ServerContext,
    pub store: Arc<InMemoryUserStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub app: Router,
}

pub fn test_harness() -> TestHarness {
    let store = Arc::new(InMemoryUserStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let ctx = ServerContext::new(
        ServerConfig::default(),
        shared_test_key(),
        Arc::clone(&store) as Arc<dyn transit_auth_server::store::UserStore>,
        Arc::clone(&publisher) as Arc<dyn NotificationPublisher>,
    )
    .unwrap();
    let app = routes::router(ctx.clone());
    TestHarness {
        ctx,
        store,
        publisher,
        app,
    }
}

/// Seed an enabled password user; returns the record as stored
pub fn seed_password_user(
    store: &InMemoryUserStore,
    user_id: i64,
    email: &str,
    password: &str,
) -> UserRecord {
    let record = UserRecord {
        user_id,
        user_uuid: Uuid::new_v4(),
        email: email.to_owned(),
        first_name: "Test".into(),
        last_name: "Rider".into(),
        phone: None,
        password_hash: Some(bcrypt::hash(password, TEST_BCRYPT_COST).unwrap()),
        image_url: None,
        role: Some("USER".into()),
        authorities: None,
        mfa_enabled: false,
        mfa_secret: None,
        login_attempts: 0,
        enabled: true,
        account_non_expired: true,
        account_non_locked: true,
        google_id: None,
        auth_provider: AuthProvider::Local,
        last_login: None,
    };
    store.insert(record.clone());
    record
}

/// Collect `Set-Cookie` name/value pairs from a response into a jar
pub fn collect_cookies(response: &Response, jar: &mut Vec<(String, String)>) {
    for value in response.headers().get_all(axum::http::header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        let Some(pair) = raw.split(';').next() else {
            continue;
        };
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        jar.retain(|(n, _)| n != name);
        if !value.is_empty() {
            jar.push((name.to_owned(), value.to_owned()));
        }
    }
}

/// Render a jar as a `Cookie` request header value
pub fn cookie_header(jar: &[(String, String)]) -> String {
    jar.iter()
        .map(|(n, v)| format!("{n}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read a response body as JSON
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
