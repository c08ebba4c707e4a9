//! Login, registration, session introspection, and logout.
//!
//! Login and registration failures stay deliberately vague: the caller
//! learns that the credentials were wrong or the email is taken, never
//! which field to attack.

use crate::error::ApiError;
use crate::session::{cleared_session_cookie, maybe_identity, session_cookie};
use crate::AppState;
use api_shared::auth;
use api_shared::Identity;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use clinic_core::{NewPatient, NewUser, User};
use clinic_types::{Gender, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub age: u32,
    #[schema(value_type = String)]
    pub gender: Gender,
    pub address: Option<String>,
}

fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
        name: user.name.clone(),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in; session cookie set"),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password")
    )
)]
/// Checks credentials and mints a fresh session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginReq>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user = state
        .users
        .authenticate(&req.email, &req.password)?
        .ok_or_else(|| {
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password")
        })?;

    let token = auth::issue(&identity_of(&user), state.cfg.token_secret())?;
    let jar = jar.add(session_cookie(token, &state.cfg));
    Ok((jar, Json(json!({ "user": user.summary() }))))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account and patient profile created; session cookie set"),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Email already registered")
    )
)]
/// Self-service patient registration: creates the account, the linked
/// patient profile, and a session in one go.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, CookieJar, Json<Value>), ApiError> {
    if req.name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.password.is_empty()
        || req.mobile.trim().is_empty()
    {
        return Err(ApiError::bad_request("All fields are required"));
    }

    let user = state.users.create(NewUser {
        name: req.name.clone(),
        email: req.email,
        password: req.password,
        role: Role::Patient,
        mobile: Some(req.mobile.clone()),
        specialization: None,
    })?;

    state.patients.create(NewPatient {
        name: req.name,
        age: req.age,
        gender: req.gender,
        mobile: req.mobile,
        address: req.address,
        user_id: Some(user.id),
    })?;

    let token = auth::issue(&identity_of(&user), state.cfg.token_secret())?;
    let jar = jar.add(session_cookie(token, &state.cfg));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "user": user.summary() })),
    ))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Current user summary, or null when anonymous"))
)]
/// Resolves the current session to a fresh user summary. An anonymous or
/// stale session is not an error here; the client gets `null` and shows
/// the login page.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Value>, ApiError> {
    let Some(identity) = maybe_identity(&jar, &state.cfg) else {
        return Ok(Json(json!({ "user": null })));
    };

    let user = state.users.find_by_id(identity.user_id)?;
    Ok(Json(json!({ "user": user.map(|u| u.summary()) })))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cookie cleared"))
)]
/// Clears the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    let jar = jar.add(cleared_session_cookie(&state.cfg));
    (jar, Json(json!({ "success": true })))
}
