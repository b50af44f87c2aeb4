// ABOUTME: Tests for the correlation store TTL, read-once, and sweep behavior
// ABOUTME: Validates the replay-prevention and expiry contracts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::Duration;
use transit_auth_server::correlation::CorrelationStore;

const URL: &str = "http://localhost:8090/oauth2/authorize?client_id=mobile-app-client&redirect_uri=com.example%3A%2F%2Fcb";

#[test]
fn test_get_within_ttl_returns_url() {
    let store = CorrelationStore::new();
    store.put("tok-1", URL);
    assert_eq!(store.get("tok-1").as_deref(), Some(URL));
}

#[test]
fn test_get_unknown_token_returns_none() {
    let store = CorrelationStore::new();
    assert_eq!(store.get("never-stored"), None);
}

#[test]
fn test_expired_entry_behaves_like_absent() {
    let store = CorrelationStore::with_ttl(Duration::milliseconds(30));
    store.put("tok-1", URL);
    std::thread::sleep(std::time::Duration::from_millis(80));
    assert_eq!(store.get("tok-1"), None);
    assert_eq!(store.take("tok-1"), None);
}

#[test]
fn test_take_is_read_once() {
    let store = CorrelationStore::new();
    store.put("tok-1", URL);

    assert_eq!(store.take("tok-1").as_deref(), Some(URL));
    // Second resolution must fail even though the TTL has not elapsed
    assert_eq!(store.take("tok-1"), None);
    assert_eq!(store.get("tok-1"), None);
}

#[test]
fn test_remove_is_idempotent() {
    let store = CorrelationStore::new();
    store.put("tok-1", URL);
    store.remove("tok-1");
    store.remove("tok-1");
    assert_eq!(store.get("tok-1"), None);
}

#[test]
fn test_put_sweeps_expired_entries() {
    let store = CorrelationStore::with_ttl(Duration::milliseconds(30));
    store.put("old-1", URL);
    store.put("old-2", URL);
    std::thread::sleep(std::time::Duration::from_millis(80));

    store.put("fresh", URL);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("fresh").as_deref(), Some(URL));
}

#[test]
fn test_concurrent_put_get_take() {
    use std::sync::Arc;

    let store = Arc::new(CorrelationStore::new());
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            let token = format!("tok-{i}");
            store.put(&token, URL);
            assert_eq!(store.get(&token).as_deref(), Some(URL));
            assert_eq!(store.take(&token).as_deref(), Some(URL));
            assert_eq!(store.take(&token), None);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(store.is_empty());
}
