//! Appointment endpoints: booking, role-scoped listing, slot lookup, and
//! lifecycle status updates.
//!
//! Confidential booking fields (`uploadedFiles`, `optionalRecordData`)
//! are serialized only to the assigned doctor; every other caller gets a
//! projection with those keys removed. The redaction lives here, at the
//! single point where appointments become JSON.

use crate::error::ApiError;
use crate::session::require_identity;
use crate::AppState;
use api_shared::Identity;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::NaiveDate;
use clinic_core::{Appointment, BookingRequest, UploadedFile};
use clinic_types::{AppointmentStatus, Role, TimeSlot};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Staff-only narrowing to a single patient.
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub doctor_id: Uuid,
    pub date: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentReq {
    /// Required for staff bookings; ignored for patient-role callers,
    /// whose own profile is used.
    pub patient_id: Option<Uuid>,
    pub doctor_id: Uuid,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// One of the fixed slot labels, e.g. `"10:00 AM"`.
    pub time_slot: String,
    #[schema(value_type = Option<Vec<Object>>)]
    pub uploaded_files: Option<Vec<UploadedFile>>,
    pub optional_record_data: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateReq {
    /// Target lifecycle status, e.g. `"confirmed"`.
    pub status: String,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid date: {raw}")))
}

/// Serializes an appointment for a caller, stripping confidential fields
/// unless the caller is the assigned doctor.
fn appointment_json(appointment: &Appointment, identity: &Identity) -> Value {
    let mut value = json!(appointment);
    let is_assigned_doctor =
        identity.role == Role::Doctor && appointment.doctor_id == identity.user_id;
    if !is_assigned_doctor {
        if let Some(obj) = value.as_object_mut() {
            obj.remove("uploadedFiles");
            obj.remove("optionalRecordData");
        }
    }
    value
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(("patientId" = Option<String>, Query, description = "Staff-only patient filter")),
    responses(
        (status = 200, description = "Role-scoped appointment list, newest date first"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;

    let appointments = state.appointments.list_for(&identity, query.patient_id)?;
    let rows: Vec<Value> = appointments
        .iter()
        .map(|a| appointment_json(a, &identity))
        .collect();
    Ok(Json(json!({ "appointments": rows })))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked with status waiting"),
        (status = 400, description = "Malformed date, slot, or attachment"),
        (status = 404, description = "Unknown patient or doctor"),
        (status = 409, description = "Slot already taken")
    )
)]
/// Books an appointment. Patient-role callers book for their own linked
/// profile; staff name the patient explicitly.
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<BookAppointmentReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;

    let patient_id = if identity.role == Role::Patient {
        state
            .patients
            .find_by_user(identity.user_id)?
            .map(|p| p.id)
            .ok_or_else(|| ApiError::bad_request("Patient profile not found"))?
    } else {
        req.patient_id
            .ok_or_else(|| ApiError::bad_request("patientId is required"))?
    };

    let time_slot = TimeSlot::parse(&req.time_slot)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let appointment = state.appointments.create(BookingRequest {
        patient_id,
        doctor_id: req.doctor_id,
        date: parse_date(&req.date)?,
        time_slot,
        uploaded_files: req.uploaded_files.unwrap_or_default(),
        optional_record_data: req.optional_record_data,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "appointment": appointment_json(&appointment, &identity) })),
    ))
}

#[utoipa::path(
    get,
    path = "/appointments/slots",
    params(
        ("doctorId" = String, Query, description = "Doctor user id"),
        ("date" = String, Query, description = "Calendar date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Free slot labels in fixed order"),
        (status = 401, description = "No valid session")
    )
)]
/// Free slots for a doctor on a date — the booking picker's source of truth.
pub async fn slots(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, ApiError> {
    require_identity(&jar, &state.cfg)?;

    let date = parse_date(&query.date)?;
    let slots: Vec<&str> = state
        .appointments
        .available_slots(query.doctor_id, date)?
        .into_iter()
        .map(TimeSlot::label)
        .collect();
    Ok(Json(json!({ "slots": slots })))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = StatusUpdateReq,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 403, description = "Patient-role callers cannot change status"),
        (status = 404, description = "No such appointment")
    )
)]
/// Moves an appointment along its lifecycle. Staff and doctors only; the
/// transition table rejects skips and reversions.
pub async fn set_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateReq>,
) -> Result<Json<Value>, ApiError> {
    let identity = require_identity(&jar, &state.cfg)?;
    if identity.role == Role::Patient {
        return Err(ApiError::forbidden("Forbidden"));
    }

    let status: AppointmentStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::bad_request(format!("unknown status: {}", req.status)))?;

    let appointment = state.appointments.set_status(id, status)?;
    Ok(Json(
        json!({ "appointment": appointment_json(&appointment, &identity) }),
    ))
}
