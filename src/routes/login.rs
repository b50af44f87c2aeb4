// ABOUTME: Browser login, second-factor, and registration pages
// ABOUTME: Terminal actions hand off to the login completion bridge
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Transit Platform

//! Browser authentication routes
//!
//! `/login` and `/mfa` are the pages the authorization interceptor forces a
//! mobile user through; `/register` is the browser-side account creation
//! form. Credential failures re-render the originating page with a generic
//! message stored as a one-shot session attribute - internal error text
//! never reaches the page.

use crate::constants::mobile::AUTH_TOKEN_PARAM;
use crate::constants::session::{FLASH_ERROR_KEY, FLASH_SUCCESS_KEY};
use crate::context::ServerContext;
use crate::models::{AuthenticatedPrincipal, LoginSource};
use crate::routes::auth::{AuthService, RegistrationData};
use crate::session::session_cookie;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

/// Browser route definitions
pub fn routes() -> Router<ServerContext> {
    Router::new()
        .route("/login", get(login_page).post(process_login))
        .route("/mfa", get(mfa_page).post(process_mfa))
        .route("/register", get(register_page).post(process_registration))
}

#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    error: Option<String>,
    mobile_auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
    mobile_auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MfaForm {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterForm {
    email: String,
    password: String,
    confirm_password: Option<String>,
    first_name: String,
    last_name: String,
    phone: Option<String>,
}

async fn login_page(
    State(ctx): State<ServerContext>,
    jar: CookieJar,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    let message = take_flash(&ctx, &jar, FLASH_ERROR_KEY).or_else(|| {
        query
            .error
            .as_ref()
            .map(|_| "Incorrect email or password".to_owned())
    });
    let success = take_flash(&ctx, &jar, FLASH_SUCCESS_KEY);

    Html(render_login_page(
        message.as_deref(),
        success.as_deref(),
        query.mobile_auth_token.as_deref(),
    ))
    .into_response()
}

async fn process_login(
    State(ctx): State<ServerContext>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (sid, session_is_new) = ctx.sessions().resolve_or_create(&jar);
    let mut jar = jar;
    if session_is_new {
        jar = jar.add(session_cookie(&sid));
    }

    match AuthService::authenticate_password(&ctx, &form.email, &form.password).await {
        Ok(user) => {
            if user.mfa_enabled && user.mfa_secret.is_some() {
                // Primary authentication done; park the principal until the
                // second factor confirms
                let principal = AuthenticatedPrincipal::normalize(&user, LoginSource::Password);
                ctx.sessions().set_pending_mfa(&sid, principal);
                return (jar, Redirect::to("/mfa")).into_response();
            }

            ctx.bridge()
                .complete(
                    &sid,
                    jar,
                    form.mobile_auth_token.as_deref(),
                    &user,
                    LoginSource::Password,
                )
                .into_response()
        }
        Err(error) => {
            ctx.sessions()
                .set_attribute(&sid, FLASH_ERROR_KEY, &error.user_message());
            let destination = match form.mobile_auth_token.as_deref() {
                Some(token) if !token.is_empty() => {
                    format!("/login?error&{AUTH_TOKEN_PARAM}={token}")
                }
                _ => "/login?error".to_owned(),
            };
            (jar, Redirect::to(&destination)).into_response()
        }
    }
}

async fn mfa_page(State(ctx): State<ServerContext>, jar: CookieJar) -> Response {
    let Some(sid) = ctx.sessions().resolve(&jar) else {
        return Redirect::to("/login").into_response();
    };
    let Some(pending) = ctx.sessions().pending_mfa(&sid) else {
        return Redirect::to("/login").into_response();
    };

    let message = take_flash(&ctx, &jar, FLASH_ERROR_KEY);
    Html(render_mfa_page(&pending.email, message.as_deref())).into_response()
}

async fn process_mfa(
    State(ctx): State<ServerContext>,
    jar: CookieJar,
    Form(form): Form<MfaForm>,
) -> Response {
    let Some(sid) = ctx.sessions().resolve(&jar) else {
        return Redirect::to("/login").into_response();
    };
    let Some(pending) = ctx.sessions().pending_mfa(&sid) else {
        return Redirect::to("/login").into_response();
    };

    // The seed stays with the persistence collaborator; fetch it per attempt
    let secret = match ctx.users().find_user_by_email(&pending.email).await {
        Ok(Some(user)) => user.mfa_secret,
        Ok(None) | Err(_) => None,
    };
    let Some(secret) = secret else {
        tracing::error!(email = %pending.email, "pending MFA user has no TOTP seed");
        ctx.sessions()
            .set_attribute(&sid, FLASH_ERROR_KEY, "An error occurred. Please try again.");
        return (jar, Redirect::to("/login?error")).into_response();
    };

    match AuthService::verify_mfa_code(&ctx, pending.user_uuid, &secret, &form.code) {
        Ok(()) => {
            let principal = ctx.sessions().take_pending_mfa(&sid).unwrap_or(pending);
            ctx.bridge()
                .complete_with_principal(&sid, jar, None, principal)
                .into_response()
        }
        Err(error) => {
            ctx.sessions()
                .set_attribute(&sid, FLASH_ERROR_KEY, &error.user_message());
            (jar, Redirect::to("/mfa?error")).into_response()
        }
    }
}

async fn register_page(State(ctx): State<ServerContext>, jar: CookieJar) -> Response {
    let error = take_flash(&ctx, &jar, FLASH_ERROR_KEY);
    Html(render_register_page(error.as_deref())).into_response()
}

async fn process_registration(
    State(ctx): State<ServerContext>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (sid, session_is_new) = ctx.sessions().resolve_or_create(&jar);
    let mut jar = jar;
    if session_is_new {
        jar = jar.add(session_cookie(&sid));
    }

    let data = RegistrationData {
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
        first_name: form.first_name,
        last_name: form.last_name,
        phone: form.phone,
    };

    match AuthService::register(&ctx, data).await {
        Ok(()) => {
            ctx.sessions().set_attribute(
                &sid,
                FLASH_SUCCESS_KEY,
                "Account created. Check your email to activate your account.",
            );
            (jar, Redirect::to("/login")).into_response()
        }
        Err(error) => {
            ctx.sessions()
                .set_attribute(&sid, FLASH_ERROR_KEY, &error.user_message());
            (jar, Redirect::to("/register?error")).into_response()
        }
    }
}

/// Read and clear a one-shot session message
fn take_flash(ctx: &ServerContext, jar: &CookieJar, key: &str) -> Option<String> {
    let sid = ctx.sessions().resolve(jar)?;
    let value = ctx.sessions().attribute(&sid, key)?;
    ctx.sessions().remove_attribute(&sid, key);
    Some(value)
}

fn render_login_page(error: Option<&str>, success: Option<&str>, token: Option<&str>) -> String {
    let banner = match (error, success) {
        (Some(msg), _) => format!(
            r#"<p class="error">{}</p>"#,
            html_escape::encode_text(msg)
        ),
        (None, Some(msg)) => format!(
            r#"<p class="success">{}</p>"#,
            html_escape::encode_text(msg)
        ),
        (None, None) => String::new(),
    };
    let token_field = token.map_or_else(String::new, |t| {
        format!(
            r#"<input type="hidden" name="mobile_auth_token" value="{}">"#,
            html_escape::encode_double_quoted_attribute(t)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
{banner}
<form method="post" action="/login">
  {token_field}
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Sign in</button>
</form>
<p><a href="/register">Create an account</a></p>
</body>
</html>
"#
    )
}

fn render_mfa_page(email: &str, error: Option<&str>) -> String {
    let banner = error.map_or_else(String::new, |msg| {
        format!(
            r#"<p class="error">{}</p>"#,
            html_escape::encode_text(msg)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Verification code</title></head>
<body>
<h1>Verification code</h1>
<p>Enter the code from your authenticator app for {}.</p>
{banner}
<form method="post" action="/mfa">
  <label>Code <input type="text" name="code" inputmode="numeric" autocomplete="one-time-code" required></label>
  <button type="submit">Verify</button>
</form>
</body>
</html>
"#,
        html_escape::encode_text(email)
    )
}

fn render_register_page(error: Option<&str>) -> String {
    let banner = error.map_or_else(String::new, |msg| {
        format!(
            r#"<p class="error">{}</p>"#,
            html_escape::encode_text(msg)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Create an account</title></head>
<body>
<h1>Create an account</h1>
{banner}
<form method="post" action="/register">
  <label>First name <input type="text" name="firstName" required></label>
  <label>Last name <input type="text" name="lastName" required></label>
  <label>Email <input type="email" name="email" required></label>
  <label>Phone <input type="tel" name="phone"></label>
  <label>Password <input type="password" name="password" required></label>
  <label>Confirm password <input type="password" name="confirmPassword" required></label>
  <button type="submit">Create account</button>
</form>
<p><a href="/login">Back to sign in</a></p>
</body>
</html>
"#
    )
}
