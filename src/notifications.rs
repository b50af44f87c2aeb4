// ABOUTME: Notification event types and the fire-and-forget publisher seam
// ABOUTME: Publish failures are logged and swallowed; callers never fail on them
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Notification publishing
//!
//! Registration asks the notification service to send a verification email.
//! Delivery transport is a collaborator behind [`NotificationPublisher`];
//! this service only builds the event and hands it off. A publish failure
//! must never fail the operation that produced it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kinds of domain events this service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A user account was created and needs email verification
    UserCreated,
}

/// Domain event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventKind,
    pub data: HashMap<String, String>,
}

/// Envelope handed to the transport, with routing headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub payload: Event,
    pub headers: HashMap<String, String>,
}

impl Notification {
    /// Wrap an event with a fresh message id and timestamp header
    #[must_use]
    pub fn new(payload: Event) -> Self {
        let mut headers = HashMap::new();
        headers.insert("id".to_owned(), Uuid::new_v4().to_string());
        headers.insert("timestamp".to_owned(), chrono::Utc::now().to_rfc3339());
        Self { payload, headers }
    }

    /// Build the verification-email event fired after registration
    #[must_use]
    pub fn user_created(verification_token: &str, name: &str, email: &str) -> Self {
        let mut data = HashMap::new();
        data.insert("token".to_owned(), verification_token.to_owned());
        data.insert("name".to_owned(), name.to_owned());
        data.insert("email".to_owned(), email.to_owned());
        Self::new(Event {
            event_type: EventKind::UserCreated,
            data,
        })
    }
}

/// Transport seam for outbound notifications
pub trait NotificationPublisher: Send + Sync {
    /// Hand a notification to the transport
    fn publish(&self, notification: &Notification) -> Result<()>;
}

/// Publish `notification`, logging and swallowing any failure.
///
/// The operation that produced the event (e.g. registration) already
/// succeeded; notification delivery is best-effort.
pub fn publish_best_effort(publisher: &dyn NotificationPublisher, notification: &Notification) {
    match publisher.publish(notification) {
        Ok(()) => {
            tracing::info!(event = ?notification.payload.event_type, "notification published");
        }
        Err(e) => {
            tracing::error!(
                event = ?notification.payload.event_type,
                error = %e,
                "failed to publish notification"
            );
        }
    }
}

/// Default transport: logs the event instead of delivering it.
///
/// Production wires a real broker client here; tests use a recording
/// implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPublisher;

impl NotificationPublisher for LoggingPublisher {
    fn publish(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            event = ?notification.payload.event_type,
            data = ?notification.payload.data.keys().collect::<Vec<_>>(),
            "notification (logging transport)"
        );
        Ok(())
    }
}
