//! Session credential issue and verification.
//!
//! The session is a signed, time-limited JWT delivered to the browser as
//! an HTTP-only cookie. Handlers verify the token once at the boundary
//! and thread the resulting [`Identity`] value into domain calls, so
//! authorization logic never re-derives the caller ad hoc.
//!
//! Every verification failure collapses into [`AuthError::InvalidCredential`]:
//! a missing cookie, an expired token, and a malformed token are
//! indistinguishable to the client. This is deliberate information
//! hiding, not sloppiness.

use clinic_types::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "clinic_token";

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 7;

/// Errors raised by credential handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Uniform failure for any unusable credential (missing, expired,
    /// malformed, bad signature). Never tells the caller which.
    #[error("invalid session credential")]
    InvalidCredential,
    /// The credential could not be signed at issue time.
    #[error("failed to sign session credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    /// The system clock is unusable.
    #[error("system time error")]
    Clock,
}

/// The verified caller, as carried by the session credential.
///
/// This is an explicit value passed into domain operations rather than
/// something each handler re-reads from ambient request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
}

/// JWT claims for the session credential.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user's internal identifier.
    sub: String,
    email: String,
    role: Role,
    name: String,
    iat: u64,
    exp: u64,
}

fn unix_now() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| AuthError::Clock)
}

/// Issues a signed session credential for `identity`, expiring in 7 days.
pub fn issue(identity: &Identity, secret: &str) -> Result<String, AuthError> {
    let now = unix_now()?;
    let claims = Claims {
        sub: identity.user_id.to_string(),
        email: identity.email.clone(),
        role: identity.role,
        name: identity.name.clone(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

/// Verifies a session credential and derives the caller's identity.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredential`] for every failure mode —
/// expiry, tampering, malformed payloads, and unparseable subjects are
/// not distinguished.
pub fn verify(token: &str, secret: &str) -> Result<Identity, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidCredential)?;

    let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidCredential)?;

    Ok(Identity {
        user_id,
        email: data.claims.email,
        role: data.claims.role,
        name: data.claims.name,
    })
}
