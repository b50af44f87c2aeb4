// ABOUTME: Server binary - loads configuration, builds the context, and serves HTTP
// ABOUTME: Generates an ephemeral signing key when none is configured (development only)
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

use anyhow::{Context, Result};
use std::sync::Arc;
use transit_auth_server::config::ServerConfig;
use transit_auth_server::context::ServerContext;
use transit_auth_server::crypto::SigningKeyPair;
use transit_auth_server::logging;
use transit_auth_server::notifications::LoggingPublisher;
use transit_auth_server::routes;
use transit_auth_server::store::memory::InMemoryUserStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;
    logging::init(&config.log_level)?;

    let keys = match &config.rsa_private_key_pem {
        Some(pem) => SigningKeyPair::import_private_key_pem("transit-auth-key", pem)
            .context("failed to import RSA_PRIVATE_KEY_PEM")?,
        None => {
            tracing::warn!(
                "RSA_PRIVATE_KEY_PEM not set; generating an ephemeral signing key \
                 (issued tokens will not survive a restart)"
            );
            SigningKeyPair::generate("transit-auth-key")?
        }
    };

    let http_port = config.http_port;
    let ctx = ServerContext::new(
        config,
        keys,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(LoggingPublisher),
    )?;

    let app = routes::router(ctx);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port))
        .await
        .with_context(|| format!("failed to bind port {http_port}"))?;
    tracing::info!(port = http_port, "transit-auth-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
    }
    tracing::info!("shutdown signal received");
}
