// ABOUTME: Route module organization and router assembly
// ABOUTME: Domain modules with thin handlers; the authorize interceptor wraps the whole router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Route modules
//!
//! Each domain module contains route definitions and thin handler functions
//! that delegate to service layers. The authorization interceptor is a
//! router-wide layer, mirroring its role as a filter in front of every
//! request.

/// Authentication business logic shared across surfaces
pub mod auth;
/// Health check routes
pub mod health;
/// Browser login, second-factor, and registration pages
pub mod login;
/// Mobile-facing authentication API
pub mod mobile;
/// Authorization endpoint delegation point
pub mod oauth2;

use crate::context::ServerContext;
use crate::middleware::authorize_interceptor;
use axum::middleware;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
#[must_use]
pub fn router(ctx: ServerContext) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(login::routes())
        .merge(mobile::routes())
        .merge(oauth2::routes())
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            authorize_interceptor,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
