//! Session cookie plumbing.
//!
//! The session credential travels in an HTTP-only cookie; handlers never
//! hand the token to the client any other way. Identity extraction
//! collapses every failure (no cookie, expired token, malformed token)
//! into the same 401, matching the verify-side policy in `api_shared`.

use crate::error::ApiError;
use api_shared::auth::{self, SESSION_TTL_SECS};
use api_shared::{Identity, SESSION_COOKIE};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use clinic_core::CoreConfig;
use time::Duration;

/// Derives the caller's identity from the session cookie, or fails with
/// a uniform 401.
pub fn require_identity(jar: &CookieJar, cfg: &CoreConfig) -> Result<Identity, ApiError> {
    let cookie = jar.get(SESSION_COOKIE).ok_or_else(ApiError::unauthorized)?;
    auth::verify(cookie.value(), cfg.token_secret()).map_err(|_| ApiError::unauthorized())
}

/// Like [`require_identity`] but for endpoints where an anonymous caller
/// is a valid state (`/auth/me`).
pub fn maybe_identity(jar: &CookieJar, cfg: &CoreConfig) -> Option<Identity> {
    let cookie = jar.get(SESSION_COOKIE)?;
    auth::verify(cookie.value(), cfg.token_secret()).ok()
}

/// Builds the session cookie: HTTP-only, `SameSite=Lax`, 7-day lifetime,
/// `Secure` when the deployment says so.
pub fn session_cookie(token: String, cfg: &CoreConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure_cookies())
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// An immediately-expiring replacement cookie, used by logout.
pub fn cleared_session_cookie(cfg: &CoreConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure_cookies())
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
