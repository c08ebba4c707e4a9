//! Consultation endpoints.

use crate::error::ApiError;
use crate::session::require_identity;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use clinic_core::NewConsultation;
use clinic_types::{NonEmptyText, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsultationReq {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescription: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub follow_up_date: Option<String>,
    pub notes: Option<String>,
}

fn required_text(value: &str, field: &str) -> Result<NonEmptyText, ApiError> {
    NonEmptyText::new(value).map_err(|_| ApiError::bad_request(format!("{field} is required")))
}

#[utoipa::path(
    get,
    path = "/consultations",
    params(("patientId" = Option<String>, Query, description = "Patient filter")),
    responses(
        (status = 200, description = "Consultations, newest first"),
        (status = 401, description = "No valid session")
    )
)]
/// Lists consultations. Patients are pinned to their own records, a
/// doctor with no filter sees their own consultations, staff see all.
pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;

    let consultations = match identity.role {
        Role::Patient => {
            let Some(own) = state.patients.find_by_user(identity.user_id)? else {
                return Ok(Json(json!({ "consultations": [] })));
            };
            state.consultations.list_for(Some(own.id))?
        }
        Role::Doctor => match query.patient_id {
            Some(patient_id) => state.consultations.list_for(Some(patient_id))?,
            None => state.consultations.list_for_doctor(identity.user_id)?,
        },
        Role::Admin | Role::Receptionist => state.consultations.list_for(query.patient_id)?,
    };

    Ok(Json(json!({ "consultations": consultations })))
}

#[utoipa::path(
    post,
    path = "/consultations",
    request_body = CreateConsultationReq,
    responses(
        (status = 201, description = "Consultation recorded; appointment completed"),
        (status = 400, description = "Missing required text or ineligible appointment"),
        (status = 403, description = "Only doctors can add consultations"),
        (status = 404, description = "No such appointment")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateConsultationReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;
    if identity.role != Role::Doctor {
        return Err(ApiError::forbidden("Only doctors can add consultations"));
    }

    let follow_up_date = req
        .follow_up_date
        .as_deref()
        .map(|raw| {
            raw.parse::<NaiveDate>()
                .map_err(|_| ApiError::bad_request(format!("invalid follow-up date: {raw}")))
        })
        .transpose()?;

    let consultation = state.consultations.create(
        &identity,
        NewConsultation {
            appointment_id: req.appointment_id,
            patient_id: req.patient_id,
            symptoms: required_text(&req.symptoms, "symptoms")?,
            diagnosis: required_text(&req.diagnosis, "diagnosis")?,
            prescription: required_text(&req.prescription, "prescription")?,
            follow_up_date,
            notes: req.notes.filter(|n| !n.trim().is_empty()),
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "consultation": consultation })),
    ))
}
