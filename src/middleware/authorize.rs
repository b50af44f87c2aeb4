// ABOUTME: Authorization interceptor - captures mobile /oauth2/authorize requests and forces login
// ABOUTME: Saves the authorization URL through three channels, then redirects to /login with a token
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Authorization request interceptor
//!
//! Every `/oauth2/authorize` request passes through here. Non-mobile
//! requests are untouched. A mobile request is in one of two states:
//!
//! - `LOGIN_COMPLETED`: the "login just finished" marker (cookie or session
//!   attribute) is present. The marker and the URL fallback channels are
//!   cleared and the request continues to the upstream authorization
//!   endpoint unchanged.
//! - `AWAITING_LOGIN`: the full request URL is captured under a fresh
//!   correlation token in the correlation store, the session, AND a cookie -
//!   three independent channels, because any one of them can fail (cache
//!   loss on restart, disabled cookies, no session affinity). The session's
//!   authentication is cleared to force a fresh login even when a stale
//!   session exists, and the browser is redirected to
//!   `/login?mobile_auth_token=<token>`.

use crate::constants::limits::AUTH_COOKIE_MAX_AGE_SECS;
use crate::constants::mobile;
use crate::context::ServerContext;
use crate::session::session_cookie;
use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::collections::HashMap;
use uuid::Uuid;

/// Interceptor entry point, installed as a router layer
pub async fn authorize_interceptor(
    State(ctx): State<ServerContext>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().contains("/oauth2/authorize") {
        return next.run(request).await;
    }

    let params: HashMap<String, String> = request
        .uri()
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    let client_id = params.get("client_id").map(String::as_str);
    let redirect_uri = params.get("redirect_uri").map(String::as_str);

    tracing::info!(?client_id, ?redirect_uri, "authorize request");

    if !is_mobile_request(&ctx, client_id, redirect_uri) {
        return next.run(request).await;
    }

    tracing::info!("mobile authorize request detected");

    let login_just_completed = has_cookie(&jar, mobile::LOGIN_DONE_COOKIE)
        || ctx
            .sessions()
            .resolve(&jar)
            .and_then(|sid| {
                ctx.sessions()
                    .attribute(&sid, mobile::LOGIN_DONE_SESSION_KEY)
            })
            .is_some();

    if login_just_completed {
        return pass_through_post_login(&ctx, &jar, request, next).await;
    }

    capture_and_redirect(&ctx, &jar, &request)
}

/// Mobile detection: the known mobile client id, or a redirect URI with a
/// custom (non-http) scheme
fn is_mobile_request(
    ctx: &ServerContext,
    client_id: Option<&str>,
    redirect_uri: Option<&str>,
) -> bool {
    if client_id == Some(ctx.config().mobile_client_id.as_str()) {
        return true;
    }
    redirect_uri
        .and_then(|uri| url::Url::parse(uri).ok())
        .is_some_and(|uri| !matches!(uri.scheme(), "http" | "https"))
}

/// The browser just came back from a completed login: clear the marker and
/// the URL fallback channels, then let the request through to the upstream
/// authorization framework
async fn pass_through_post_login(
    ctx: &ServerContext,
    jar: &CookieJar,
    request: Request,
    next: Next,
) -> Response {
    tracing::info!("post-login authorize request - letting through");

    if let Some(sid) = ctx.sessions().resolve(jar) {
        ctx.sessions()
            .remove_attribute(&sid, mobile::LOGIN_DONE_SESSION_KEY);
        ctx.sessions()
            .remove_attribute(&sid, mobile::AUTH_URL_SESSION_KEY);
    }

    let mut response = next.run(request).await;
    append_cookie(&mut response, &removal_cookie(mobile::LOGIN_DONE_COOKIE));
    append_cookie(&mut response, &removal_cookie(mobile::AUTH_URL_COOKIE));
    response
}

/// First contact: save the authorization URL through all three channels,
/// clear any stale authentication, and send the browser to the login page
fn capture_and_redirect(ctx: &ServerContext, jar: &CookieJar, request: &Request) -> Response {
    let full_url = reconstruct_url(ctx, request);
    tracing::info!(url = %full_url, "capturing authorization URL, forcing login");

    let token = Uuid::new_v4().to_string();
    ctx.correlation().put(&token, &full_url);

    let (sid, session_is_new) = ctx.sessions().resolve_or_create(jar);
    ctx.sessions()
        .set_attribute(&sid, mobile::AUTH_URL_SESSION_KEY, &full_url);
    ctx.sessions()
        .set_attribute(&sid, mobile::AUTH_TOKEN_PARAM, &token);

    // Force re-login even if a stale authenticated session exists
    ctx.sessions().clear_principal(&sid);

    let mut response = Redirect::to(&format!(
        "/login?{}={token}",
        mobile::AUTH_TOKEN_PARAM
    ))
    .into_response();

    let url_cookie = Cookie::build((
        mobile::AUTH_URL_COOKIE,
        urlencoding::encode(&full_url).into_owned(),
    ))
    .path("/")
    .max_age(time::Duration::seconds(AUTH_COOKIE_MAX_AGE_SECS))
    .build();
    let token_cookie = Cookie::build((mobile::AUTH_TOKEN_PARAM, token))
        .path("/")
        .max_age(time::Duration::seconds(AUTH_COOKIE_MAX_AGE_SECS))
        .build();

    append_cookie(&mut response, &url_cookie);
    append_cookie(&mut response, &token_cookie);
    if session_is_new {
        append_cookie(&mut response, &session_cookie(&sid));
    }

    response
}

/// Rebuild the externally visible request URL including the query string
fn reconstruct_url(ctx: &ServerContext, request: &Request) -> String {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_owned(), ToString::to_string);
    format!("{}{path_and_query}", ctx.config().public_url)
}

fn has_cookie(jar: &CookieJar, name: &str) -> bool {
    jar.get(name).is_some_and(|c| !c.value().is_empty())
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_owned(), String::new()))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
