//! Patient registry endpoints.
//!
//! Access policy, enforced here rather than in the registry: a
//! patient-role caller only ever sees or edits their own linked profile;
//! staff roles see all and may register or edit anyone.

use crate::error::ApiError;
use crate::session::require_identity;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use clinic_core::{NewPatient, PatientUpdate};
use clinic_types::Gender;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive search over name, mobile, and patient code.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientReq {
    pub name: String,
    pub age: u32,
    #[schema(value_type = String)]
    pub gender: Gender,
    pub mobile: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientReq {
    pub id: Uuid,
    pub name: Option<String>,
    pub age: Option<u32>,
    #[schema(value_type = Option<String>)]
    pub gender: Option<Gender>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients",
    params(("q" = Option<String>, Query, description = "Search filter (staff only)")),
    responses(
        (status = 200, description = "Own profile (patient role) or all patients (staff)"),
        (status = 401, description = "No valid session")
    )
)]
/// Lists patients, scoped to the caller's role.
pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;

    if !identity.role.is_staff() {
        let own = state.patients.find_by_user(identity.user_id)?;
        let patients: Vec<_> = own.into_iter().collect();
        return Ok(Json(json!({ "patients": patients })));
    }

    let patients = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.patients.search(q)?,
        None => state.patients.list_all()?,
    };
    Ok(Json(json!({ "patients": patients })))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient registered"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Caller is not staff")
    )
)]
/// Front-desk patient registration. The profile has no linked account.
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreatePatientReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;
    if !identity.role.is_staff() {
        return Err(ApiError::forbidden("Forbidden"));
    }

    let patient = state.patients.create(NewPatient {
        name: req.name,
        age: req.age,
        gender: req.gender,
        mobile: req.mobile,
        address: req.address,
        user_id: None,
    })?;
    Ok((StatusCode::CREATED, Json(json!({ "patient": patient }))))
}

#[utoipa::path(
    patch,
    path = "/patients",
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated"),
        (status = 403, description = "Patient-role caller editing another profile"),
        (status = 404, description = "No such patient")
    )
)]
/// Edits the mutable profile fields. Identifier and code never change.
pub async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<Value>, ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;

    if !identity.role.is_staff() {
        let own = state.patients.find_by_user(identity.user_id)?;
        if own.map(|p| p.id) != Some(req.id) {
            return Err(ApiError::forbidden("Forbidden"));
        }
    }

    let patient = state.patients.update(
        req.id,
        PatientUpdate {
            name: req.name,
            age: req.age,
            gender: req.gender,
            mobile: req.mobile,
            address: req.address,
        },
    )?;
    Ok(Json(json!({ "patient": patient })))
}
