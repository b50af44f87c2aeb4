// ABOUTME: Cookie-identified in-process session store
// ABOUTME: Holds string attributes plus the pending-MFA and authenticated principals
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! In-process sessions
//!
//! The browser flow needs server-side state across redirects: the saved
//! authorization URL fallback, the login-done marker, and the principal
//! between the password step and the second-factor step. Sessions are
//! identified by an opaque id carried in the `SESSION` cookie and live only
//! in process memory - losing them is tolerable because the correlation
//! store and cookies are redundant channels for the one piece of state that
//! matters.
//!
//! The authenticated principal is an explicit slot on the session rather
//! than an ambient thread-local security context, which keeps principal
//! normalization testable in isolation.

use crate::constants::session::SESSION_COOKIE;
use crate::models::AuthenticatedPrincipal;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct Session {
    attributes: HashMap<String, String>,
    /// Principal that passed primary authentication but still owes a TOTP code
    pending_mfa: Option<AuthenticatedPrincipal>,
    /// Fully authenticated principal
    principal: Option<AuthenticatedPrincipal>,
}

/// Concurrent session store keyed by opaque session id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh session and return its id
    #[must_use]
    pub fn create(&self) -> String {
        let sid = Uuid::new_v4().to_string();
        self.sessions.insert(sid.clone(), Session::default());
        sid
    }

    /// Session id carried by the request cookies, if it names a live session
    #[must_use]
    pub fn resolve(&self, jar: &CookieJar) -> Option<String> {
        let sid = jar.get(SESSION_COOKIE)?.value().to_owned();
        self.sessions.contains_key(&sid).then_some(sid)
    }

    /// Resolve the request's session or create a new one.
    ///
    /// Returns the id and whether it was newly created (in which case the
    /// caller must attach the session cookie to its response).
    #[must_use]
    pub fn resolve_or_create(&self, jar: &CookieJar) -> (String, bool) {
        match self.resolve(jar) {
            Some(sid) => (sid, false),
            None => (self.create(), true),
        }
    }

    /// Read a string attribute
    #[must_use]
    pub fn attribute(&self, sid: &str, key: &str) -> Option<String> {
        let session = self.sessions.get(sid)?;
        session
            .attributes
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    /// Write a string attribute, creating the session if needed
    pub fn set_attribute(&self, sid: &str, key: &str, value: &str) {
        self.sessions
            .entry(sid.to_owned())
            .or_default()
            .attributes
            .insert(key.to_owned(), value.to_owned());
    }

    /// Drop a string attribute; idempotent
    pub fn remove_attribute(&self, sid: &str, key: &str) {
        if let Some(mut session) = self.sessions.get_mut(sid) {
            session.attributes.remove(key);
        }
    }

    /// Authenticated principal bound to the session
    #[must_use]
    pub fn principal(&self, sid: &str) -> Option<AuthenticatedPrincipal> {
        self.sessions.get(sid)?.principal.clone()
    }

    /// Bind (or replace) the authenticated principal
    pub fn set_principal(&self, sid: &str, principal: AuthenticatedPrincipal) {
        self.sessions.entry(sid.to_owned()).or_default().principal = Some(principal);
    }

    /// Drop the authenticated principal, forcing re-login
    pub fn clear_principal(&self, sid: &str) {
        if let Some(mut session) = self.sessions.get_mut(sid) {
            session.principal = None;
        }
    }

    /// Principal awaiting second-factor confirmation
    #[must_use]
    pub fn pending_mfa(&self, sid: &str) -> Option<AuthenticatedPrincipal> {
        self.sessions.get(sid)?.pending_mfa.clone()
    }

    /// Park a principal until its TOTP code is confirmed
    pub fn set_pending_mfa(&self, sid: &str, principal: AuthenticatedPrincipal) {
        self.sessions.entry(sid.to_owned()).or_default().pending_mfa = Some(principal);
    }

    /// Consume the pending principal (on successful confirmation)
    #[must_use]
    pub fn take_pending_mfa(&self, sid: &str) -> Option<AuthenticatedPrincipal> {
        self.sessions.get_mut(sid)?.pending_mfa.take()
    }
}

/// Build the session id cookie
#[must_use]
pub fn session_cookie(sid: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sid.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
