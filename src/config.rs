// ABOUTME: Environment-based configuration for deployment-specific settings
// ABOUTME: Parses env vars with defaults suitable for local development
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Environment-based configuration management
//!
//! All runtime settings come from environment variables with development
//! defaults; there is no config file. The RSA signing key is the one setting
//! with generate-on-boot behavior: absent `RSA_PRIVATE_KEY_PEM`, a fresh key
//! pair is created at startup (tokens then do not survive restarts, which is
//! acceptable for development only).

use anyhow::{Context, Result};
use std::env;

/// Server configuration loaded once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Externally visible base URL of this service (no trailing slash)
    pub public_url: String,
    /// `iss` claim stamped into every issued token
    pub token_issuer: String,
    /// Client id that marks a request as coming from the mobile application
    pub mobile_client_id: String,
    /// Default post-login landing page when no authorization flow is pending
    pub default_app_url: String,
    /// PEM-encoded PKCS#8 RSA private key; generated at boot when unset
    pub rsa_private_key_pem: Option<String>,
    /// Log level string for the tracing env-filter
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the environment
    ///
    /// # Errors
    /// Returns an error if a present variable fails to parse
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .with_context(|| format!("invalid HTTP_PORT value: {port}"))?,
            Err(_) => 8090,
        };

        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{http_port}"))
            .trim_end_matches('/')
            .to_owned();

        let token_issuer = env::var("TOKEN_ISSUER").unwrap_or_else(|_| public_url.clone());

        let mobile_client_id = env::var("MOBILE_CLIENT_ID")
            .unwrap_or_else(|_| crate::constants::mobile::CLIENT_ID.to_owned());

        let default_app_url =
            env::var("UI_APP_URL").unwrap_or_else(|_| "http://localhost:4202".to_owned());

        let rsa_private_key_pem = env::var("RSA_PRIVATE_KEY_PEM").ok();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        Ok(Self {
            http_port,
            public_url,
            token_issuer,
            mobile_client_id,
            default_app_url,
            rsa_private_key_pem,
            log_level,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8090,
            public_url: "http://localhost:8090".into(),
            token_issuer: "http://localhost:8090".into(),
            mobile_client_id: crate::constants::mobile::CLIENT_ID.into(),
            default_app_url: "http://localhost:4202".into(),
            rsa_private_key_pem: None,
            log_level: "info".into(),
        }
    }
}
