// ABOUTME: Authorization endpoint delegation point
// ABOUTME: Requests that clear the interceptor continue into the upstream authorization framework here
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Authorization endpoint
//!
//! The OAuth2 protocol machinery (code issuance, consent, the token
//! endpoint) is owned by the upstream authorization framework, which is a
//! collaborator of this service. The interceptor in
//! `middleware::authorize` runs in front of this route; once it lets a
//! request through, the upstream framework completes the flow. This handler
//! is the delegation point.

use crate::context::ServerContext;
use axum::routing::get;
use axum::{Json, Router};

/// Authorization endpoint route
pub fn routes() -> Router<ServerContext> {
    Router::new().route("/oauth2/authorize", get(authorization_endpoint))
}

/// Delegation stub for the upstream authorization framework
async fn authorization_endpoint() -> Json<serde_json::Value> {
    tracing::info!("authorize request handed to upstream authorization framework");
    Json(serde_json::json!({
        "status": "authorization_pending",
        "detail": "request accepted; upstream authorization framework completes the flow"
    }))
}
