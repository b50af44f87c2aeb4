// ABOUTME: Login completion bridge - reunites the browser with the in-flight authorization request
// ABOUTME: Ordered lookup chains (cache, session, cookie) resolve the redirect target once per login
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Login completion bridge
//!
//! Runs exactly once after any successful primary authentication (password,
//! federated, or second factor). HTTP redirects drop in-memory state between
//! hops, so the authorization URL captured by the interceptor has to be
//! recovered from one of three redundant channels. Both recoveries are
//! fixed-priority lookup chains:
//!
//! - correlation token: request query parameter, then cookie, then session;
//! - saved URL: correlation store (consumed on hit), then session, then
//!   cookie.
//!
//! Redirect priority: recovered authorization URL first, then an upstream
//! saved request targeting the authorization endpoint, then the configured
//! default application URL. A missing or expired correlation token is not an
//! error - the flow silently degrades to the later priorities.

use crate::constants::limits::LOGIN_DONE_COOKIE_MAX_AGE_SECS;
use crate::constants::mobile;
use crate::correlation::CorrelationStore;
use crate::models::{AuthenticatedPrincipal, LoginSource, UserRecord};
use crate::session::SessionStore;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

/// Completes a browser login by binding the principal and resolving the
/// post-login redirect
pub struct LoginCompletionBridge {
    correlation: Arc<CorrelationStore>,
    sessions: Arc<SessionStore>,
    default_app_url: String,
}

impl LoginCompletionBridge {
    /// Create the bridge over its stores
    #[must_use]
    pub fn new(
        correlation: Arc<CorrelationStore>,
        sessions: Arc<SessionStore>,
        default_app_url: String,
    ) -> Self {
        Self {
            correlation,
            sessions,
            default_app_url,
        }
    }

    /// Normalize `user` into the canonical principal and complete the login
    #[must_use]
    pub fn complete(
        &self,
        sid: &str,
        jar: CookieJar,
        query_token: Option<&str>,
        user: &UserRecord,
        source: LoginSource,
    ) -> (CookieJar, Redirect) {
        let principal = AuthenticatedPrincipal::normalize(user, source);
        self.complete_with_principal(sid, jar, query_token, principal)
    }

    /// Complete the login for an already-normalized principal (the second
    /// factor path confirmed a principal normalized at the password step)
    #[must_use]
    pub fn complete_with_principal(
        &self,
        sid: &str,
        mut jar: CookieJar,
        query_token: Option<&str>,
        principal: AuthenticatedPrincipal,
    ) -> (CookieJar, Redirect) {
        // Replace whatever authentication the session carried with the
        // normalized principal, so downstream issuance sees one shape
        self.sessions.set_principal(sid, principal.clone());
        tracing::info!(
            email = %principal.email,
            user_id = principal.user_id,
            "login completed"
        );

        if let Some(url) = self.resolve_saved_url(sid, &jar, query_token) {
            tracing::info!(%url, "redirecting back into the authorization flow");
            self.sessions
                .set_attribute(sid, mobile::LOGIN_DONE_SESSION_KEY, "true");
            jar = jar.add(
                Cookie::build((mobile::LOGIN_DONE_COOKIE, "true"))
                    .path("/")
                    .max_age(time::Duration::seconds(LOGIN_DONE_COOKIE_MAX_AGE_SECS))
                    .build(),
            );
            return (jar, Redirect::to(&url));
        }

        // Priority 2: upstream saved request, honored only when it targets
        // the authorization endpoint
        if let Some(saved) = self
            .sessions
            .attribute(sid, mobile::SAVED_REQUEST_SESSION_KEY)
        {
            if saved.contains("/oauth2/authorize") {
                tracing::info!(url = %saved, "redirecting to saved authorization request");
                return (jar, Redirect::to(&saved));
            }
        }

        tracing::info!(url = %self.default_app_url, "default post-login redirect");
        (jar, Redirect::to(&self.default_app_url))
    }

    /// Recover the saved authorization URL through the redundant channels.
    ///
    /// Token chain: query parameter, cookie, session - first hit wins.
    /// URL chain: correlation store (read-once), session, cookie.
    fn resolve_saved_url(
        &self,
        sid: &str,
        jar: &CookieJar,
        query_token: Option<&str>,
    ) -> Option<String> {
        let token_sources = [
            query_token
                .filter(|t| !t.is_empty())
                .map(std::borrow::ToOwned::to_owned),
            jar.get(mobile::AUTH_TOKEN_PARAM)
                .map(|c| c.value().to_owned())
                .filter(|t| !t.is_empty()),
            self.sessions.attribute(sid, mobile::AUTH_TOKEN_PARAM),
        ];
        let token = token_sources.into_iter().flatten().next();

        let token = token?;
        tracing::debug!(%token, "correlation token recovered");

        let url_sources = [
            self.correlation.take(&token),
            self.sessions.attribute(sid, mobile::AUTH_URL_SESSION_KEY),
            jar.get(mobile::AUTH_URL_COOKIE).and_then(|c| {
                urlencoding::decode(c.value())
                    .ok()
                    .map(std::borrow::Cow::into_owned)
            }),
        ];
        url_sources.into_iter().flatten().find(|u| !u.is_empty())
    }
}
