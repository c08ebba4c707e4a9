//! Appointment ledger.
//!
//! Appointments reference a patient and a doctor by identifier and carry
//! a date, one of the fixed time slots, and a lifecycle status. The
//! ledger owns three invariants:
//!
//! - `(doctor, date, slot)` is unique among non-cancelled appointments —
//!   the double-booking constraint, checked inside the collection write
//!   lock so check-then-create cannot interleave with another booking
//! - status writes follow the lifecycle transition table; re-asserting
//!   the current status is a no-op
//! - appointments are never deleted; cancellation is a status
//!
//! Confidential fields (`uploaded_files`, `optional_record_data`) are
//! write-once at booking and intended for the assigned doctor's eyes
//! only. That is a serialization policy: every read path that renders an
//! appointment for a non-assigned caller must omit them (see the API
//! layer's projection).

use crate::attachments::{validate_attachments, UploadedFile};
use crate::ids::{sequential_code, APPOINTMENT_CODE_PREFIX};
use crate::patients::Patient;
use crate::scheduling;
use crate::store::{Collection, SharedDatabase};
use crate::users::User;
use crate::{ClinicError, ClinicResult};
use api_shared::Identity;
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{AppointmentStatus, Role, TimeSlot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    /// Human-readable sequential code, e.g. `APT-003`.
    pub appointment_id: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    /// Confidential: assigned doctor only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uploaded_files: Vec<UploadedFile>,
    /// Confidential: assigned doctor only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_record_data: Option<String>,
}

/// A validated booking request. The caller resolves the patient (their
/// own profile for patient-role callers) before constructing this.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub uploaded_files: Vec<UploadedFile>,
    pub optional_record_data: Option<String>,
}

/// Operations over the appointment ledger.
#[derive(Clone)]
pub struct AppointmentService {
    db: SharedDatabase,
}

impl AppointmentService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Books an appointment.
    ///
    /// Verifies the referenced patient and doctor, validates attachments,
    /// then — under the ledger's write lock — re-checks slot availability
    /// and persists with status `waiting` and the next sequential code.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the patient or doctor does not exist
    /// - `Validation` when the doctor reference is not a doctor-role user
    ///   or an attachment fails validation
    /// - `SlotUnavailable` when a non-cancelled appointment already holds
    ///   the slot
    pub fn create(&self, req: BookingRequest) -> ClinicResult<Appointment> {
        validate_attachments(&req.uploaded_files)?;

        let db = self.db.get()?;

        let patient: Option<Patient> = db.get(Collection::Patients, req.patient_id)?;
        if patient.is_none() {
            return Err(ClinicError::NotFound("patient"));
        }
        match db.get::<User>(Collection::Users, req.doctor_id)? {
            None => return Err(ClinicError::NotFound("doctor")),
            Some(user) if user.role != Role::Doctor => {
                return Err(ClinicError::Validation(
                    "doctorId does not reference a doctor".into(),
                ));
            }
            Some(_) => {}
        }

        db.with_collection_lock(Collection::Appointments, || {
            let existing: Vec<Appointment> = db.list(Collection::Appointments)?;
            if !scheduling::slot_is_free(&existing, req.doctor_id, req.date, req.time_slot) {
                return Err(ClinicError::SlotUnavailable);
            }

            let appointment = Appointment {
                id: Uuid::new_v4(),
                appointment_id: sequential_code(APPOINTMENT_CODE_PREFIX, existing.len() + 1),
                patient_id: req.patient_id,
                doctor_id: req.doctor_id,
                date: req.date,
                time_slot: req.time_slot,
                status: AppointmentStatus::Waiting,
                created_at: Utc::now(),
                uploaded_files: req.uploaded_files,
                optional_record_data: req.optional_record_data,
            };
            db.put(Collection::Appointments, appointment.id, &appointment)?;
            tracing::info!(
                appointment = %appointment.appointment_id,
                doctor = %appointment.doctor_id,
                date = %appointment.date,
                slot = %appointment.time_slot,
                "appointment booked"
            );
            Ok(appointment)
        })
    }

    pub fn get(&self, id: Uuid) -> ClinicResult<Option<Appointment>> {
        self.db.get()?.get(Collection::Appointments, id)
    }

    /// Role-scoped listing, newest date first.
    ///
    /// - doctors see only their own appointments
    /// - patients see only appointments for their linked profile (none if
    ///   no profile is linked)
    /// - admin/receptionist see everything, optionally narrowed to one
    ///   patient via `patient_filter`
    pub fn list_for(
        &self,
        identity: &Identity,
        patient_filter: Option<Uuid>,
    ) -> ClinicResult<Vec<Appointment>> {
        let db = self.db.get()?;
        let mut rows: Vec<Appointment> = db.list(Collection::Appointments)?;

        match identity.role {
            Role::Doctor => rows.retain(|a| a.doctor_id == identity.user_id),
            Role::Patient => {
                let patients: Vec<Patient> = db.list(Collection::Patients)?;
                let own = patients
                    .into_iter()
                    .find(|p| p.user_id == Some(identity.user_id));
                match own {
                    Some(p) => rows.retain(|a| a.patient_id == p.id),
                    None => return Ok(Vec::new()),
                }
            }
            Role::Admin | Role::Receptionist => {
                if let Some(patient_id) = patient_filter {
                    rows.retain(|a| a.patient_id == patient_id);
                }
            }
        }

        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(rows)
    }

    /// Writes a lifecycle status, enforcing the transition table.
    ///
    /// Re-asserting the current status returns the unchanged appointment;
    /// an illegal transition (skipping forward, reverting, or leaving a
    /// terminal state) is rejected with `Validation`.
    pub fn set_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
    ) -> ClinicResult<Appointment> {
        let db = self.db.get()?;
        db.with_collection_lock(Collection::Appointments, || {
            let mut appointment: Appointment = db
                .get(Collection::Appointments, id)?
                .ok_or(ClinicError::NotFound("appointment"))?;

            if appointment.status == new_status {
                return Ok(appointment);
            }
            if !appointment.status.can_transition_to(new_status) {
                return Err(ClinicError::Validation(format!(
                    "cannot move appointment from {} to {}",
                    appointment.status, new_status
                )));
            }

            appointment.status = new_status;
            db.put(Collection::Appointments, appointment.id, &appointment)?;
            tracing::info!(
                appointment = %appointment.appointment_id,
                status = %appointment.status,
                "appointment status updated"
            );
            Ok(appointment)
        })
    }

    /// Free slots for a doctor on a date, in fixed slot order.
    pub fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> ClinicResult<Vec<TimeSlot>> {
        let appointments: Vec<Appointment> = self.db.get()?.list(Collection::Appointments)?;
        Ok(scheduling::available_slots(&appointments, doctor_id, date))
    }
}
