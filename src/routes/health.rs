// ABOUTME: Health check route for service monitoring
// ABOUTME: Liveness endpoint for load balancers and orchestration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Health check routes

use crate::context::ServerContext;
use axum::routing::get;
use axum::{Json, Router};

/// Health route definitions
pub fn routes() -> Router<ServerContext> {
    async fn health_handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    Router::new().route("/health", get(health_handler))
}
