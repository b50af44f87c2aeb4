// ABOUTME: Time-bounded correlation store linking opaque tokens to saved authorization URLs
// ABOUTME: Read-once consumption with a lazy sweep; get honors the TTL itself
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Correlation store
//!
//! Maps an opaque correlation token to the authorization URL captured when a
//! mobile `/oauth2/authorize` request was intercepted. Entries expire after
//! five minutes; an expired-but-present entry behaves exactly like an absent
//! one. Expired entries are purged opportunistically on `put` - correctness
//! never depends on the sweep, only on the TTL check inside `get`.
//!
//! Consumption is read-once: the bridge calls [`CorrelationStore::take`],
//! which removes the entry, so a token that resolved once can never resolve
//! again (replay prevention).

use crate::constants::limits::CORRELATION_TTL_SECS;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct CorrelationEntry {
    saved_url: String,
    created_at: DateTime<Utc>,
}

impl CorrelationEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }
}

/// Concurrent token -> saved-URL store with a fixed TTL.
///
/// Explicitly constructed and injected (one per server), never a
/// process-wide static. All operations are safe from arbitrary threads.
#[derive(Debug)]
pub struct CorrelationStore {
    entries: DashMap<String, CorrelationEntry>,
    ttl: Duration,
}

impl CorrelationStore {
    /// Create a store with the standard five-minute TTL
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(
            i64::try_from(CORRELATION_TTL_SECS).unwrap_or(300),
        ))
    }

    /// Create a store with a custom TTL
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record `url` under `token` with the current timestamp, sweeping
    /// expired entries first to bound memory
    pub fn put(&self, token: &str, url: &str) {
        self.sweep_expired();
        self.entries.insert(
            token.to_owned(),
            CorrelationEntry {
                saved_url: url.to_owned(),
                created_at: Utc::now(),
            },
        );
        tracing::debug!(token, "authorization URL saved to correlation store");
    }

    /// Resolve the URL for `token` without consuming it.
    ///
    /// Returns `None` for unknown and for expired tokens alike.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<String> {
        let entry = self.entries.get(token)?;
        if entry.is_expired(self.ttl) {
            return None;
        }
        Some(entry.saved_url.clone())
    }

    /// Resolve and consume: the entry is removed, so a second call with the
    /// same token returns `None` even inside the TTL window
    #[must_use]
    pub fn take(&self, token: &str) -> Option<String> {
        let (_, entry) = self.entries.remove(token)?;
        if entry.is_expired(self.ttl) {
            return None;
        }
        tracing::debug!(token, "correlation token consumed");
        Some(entry.saved_url)
    }

    /// Remove an entry; idempotent
    pub fn remove(&self, token: &str) {
        self.entries.remove(token);
    }

    /// Number of live (non-expired) entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.value().is_expired(self.ttl))
            .count()
    }

    /// Whether the store holds no live entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_expired(&self) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "swept expired correlation entries");
        }
    }
}

impl Default for CorrelationStore {
    fn default() -> Self {
        Self::new()
    }
}
