//! Consultation ledger.
//!
//! A consultation is the clinical record of one completed visit: at most
//! one per appointment, created only by the appointment's own doctor
//! while the visit is `confirmed` or `in-progress`, and immutable once
//! written. Recording a consultation closes the appointment — the status
//! moves to `completed` inside the same locked section as the
//! consultation write, so a crash cannot leave one half done within this
//! process.

use crate::appointments::Appointment;
use crate::store::{Collection, SharedDatabase};
use crate::{ClinicError, ClinicResult};
use api_shared::Identity;
use chrono::{DateTime, NaiveDate, Utc};
use clinic_types::{AppointmentStatus, NonEmptyText, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored consultation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub symptoms: String,
    pub diagnosis: String,
    pub prescription: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new consultation. The required texts are validated at
/// the type level; the doctor comes from the caller's identity.
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub symptoms: NonEmptyText,
    pub diagnosis: NonEmptyText,
    pub prescription: NonEmptyText,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Operations over the consultation ledger.
#[derive(Clone)]
pub struct ConsultationService {
    db: SharedDatabase,
}

impl ConsultationService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Records a consultation and completes the referenced appointment.
    ///
    /// Eligibility, all checked under the appointment write lock:
    /// - the caller is a doctor, and the appointment's assigned doctor
    /// - the appointment exists and references the given patient
    /// - the appointment is `confirmed` or `in-progress`
    /// - no consultation already references the appointment
    pub fn create(&self, doctor: &Identity, new: NewConsultation) -> ClinicResult<Consultation> {
        if doctor.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }

        let db = self.db.get()?;
        // The appointment lock also serializes consultation writes; every
        // consultation create flows through here.
        db.with_collection_lock(Collection::Appointments, || {
            let mut appointment: Appointment = db
                .get(Collection::Appointments, new.appointment_id)?
                .ok_or(ClinicError::NotFound("appointment"))?;

            if appointment.doctor_id != doctor.user_id {
                return Err(ClinicError::Forbidden);
            }
            if appointment.patient_id != new.patient_id {
                return Err(ClinicError::Validation(
                    "patient does not match the appointment".into(),
                ));
            }
            if !matches!(
                appointment.status,
                AppointmentStatus::Confirmed | AppointmentStatus::InProgress
            ) {
                return Err(ClinicError::Validation(
                    "appointment is not awaiting consultation".into(),
                ));
            }

            let existing: Vec<Consultation> = db.list(Collection::Consultations)?;
            if existing
                .iter()
                .any(|c| c.appointment_id == new.appointment_id)
            {
                return Err(ClinicError::Validation(
                    "a consultation already exists for this appointment".into(),
                ));
            }

            let consultation = Consultation {
                id: Uuid::new_v4(),
                appointment_id: new.appointment_id,
                patient_id: new.patient_id,
                doctor_id: doctor.user_id,
                symptoms: new.symptoms.into_inner(),
                diagnosis: new.diagnosis.into_inner(),
                prescription: new.prescription.into_inner(),
                follow_up_date: new.follow_up_date,
                notes: new.notes,
                created_at: Utc::now(),
            };
            db.put(Collection::Consultations, consultation.id, &consultation)?;

            // Recording the consultation closes the visit.
            appointment.status = AppointmentStatus::Completed;
            db.put(Collection::Appointments, appointment.id, &appointment)?;

            tracing::info!(
                consultation = %consultation.id,
                appointment = %appointment.appointment_id,
                "consultation recorded, appointment completed"
            );
            Ok(consultation)
        })
    }

    /// Consultations, optionally filtered to one patient, newest first.
    pub fn list_for(&self, patient_filter: Option<Uuid>) -> ClinicResult<Vec<Consultation>> {
        let mut rows: Vec<Consultation> = self.db.get()?.list(Collection::Consultations)?;
        if let Some(patient_id) = patient_filter {
            rows.retain(|c| c.patient_id == patient_id);
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// One doctor's consultations, newest first.
    pub fn list_for_doctor(&self, doctor_id: Uuid) -> ClinicResult<Vec<Consultation>> {
        let mut rows: Vec<Consultation> = self.db.get()?.list(Collection::Consultations)?;
        rows.retain(|c| c.doctor_id == doctor_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::{AppointmentService, BookingRequest};
    use crate::patients::Patient;
    use crate::store::Database;
    use crate::users::User;
    use clinic_types::TimeSlot;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Arc<Database>,
        appointments: AppointmentService,
        consultations: ConsultationService,
        doctor: Identity,
        patient: Uuid,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let shared = SharedDatabase::new(dir.path().to_path_buf());
        let db = shared.get().unwrap();

        let doctor_id = Uuid::new_v4();
        let user = User {
            id: doctor_id,
            name: "Dr. Sree Ram".into(),
            email: "doctor@clinic.com".into(),
            password_hash: "$2b$12$test".into(),
            role: Role::Doctor,
            mobile: None,
            specialization: Some("General Medicine".into()),
            created_at: Utc::now(),
        };
        db.put(Collection::Users, user.id, &user).unwrap();

        let patient = Patient {
            id: Uuid::new_v4(),
            patient_id: "PAT-001".into(),
            name: "Amit Patel".into(),
            age: 35,
            gender: clinic_types::Gender::Male,
            mobile: "9123456780".into(),
            address: "12 MG Road, Mumbai".into(),
            registration_date: "2025-12-01".parse().unwrap(),
            user_id: None,
        };
        db.put(Collection::Patients, patient.id, &patient).unwrap();

        Fixture {
            _dir: dir,
            db,
            appointments: AppointmentService::new(shared.clone()),
            consultations: ConsultationService::new(shared),
            doctor: Identity {
                user_id: doctor_id,
                email: "doctor@clinic.com".into(),
                role: Role::Doctor,
                name: "Dr. Sree Ram".into(),
            },
            patient: patient.id,
        }
    }

    fn booked_appointment(fx: &Fixture, status: AppointmentStatus) -> Appointment {
        let appt = fx
            .appointments
            .create(BookingRequest {
                patient_id: fx.patient,
                doctor_id: fx.doctor.user_id,
                date: "2026-03-01".parse().unwrap(),
                time_slot: TimeSlot::parse("10:00 AM").unwrap(),
                uploaded_files: Vec::new(),
                optional_record_data: None,
            })
            .unwrap();
        if status != AppointmentStatus::Waiting {
            // Walk the lifecycle forward to the wanted status
            for next in [
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
            ] {
                fx.appointments.set_status(appt.id, next).unwrap();
                if next == status {
                    break;
                }
            }
        }
        fx.appointments.get(appt.id).unwrap().unwrap()
    }

    fn consultation_for(fx: &Fixture, appointment_id: Uuid) -> NewConsultation {
        NewConsultation {
            appointment_id,
            patient_id: fx.patient,
            symptoms: NonEmptyText::new("fever, cough").unwrap(),
            diagnosis: NonEmptyText::new("viral infection").unwrap(),
            prescription: NonEmptyText::new("rest and fluids").unwrap(),
            follow_up_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_create_completes_the_appointment() {
        let fx = fixture();
        let appt = booked_appointment(&fx, AppointmentStatus::Confirmed);

        let consultation = fx
            .consultations
            .create(&fx.doctor, consultation_for(&fx, appt.id))
            .unwrap();
        assert_eq!(consultation.doctor_id, fx.doctor.user_id);

        let closed = fx.appointments.get(appt.id).unwrap().unwrap();
        assert_eq!(closed.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_in_progress_appointment_is_eligible() {
        let fx = fixture();
        let appt = booked_appointment(&fx, AppointmentStatus::InProgress);
        assert!(fx
            .consultations
            .create(&fx.doctor, consultation_for(&fx, appt.id))
            .is_ok());
    }

    #[test]
    fn test_waiting_and_completed_appointments_are_not_eligible() {
        let fx = fixture();

        let waiting = booked_appointment(&fx, AppointmentStatus::Waiting);
        assert!(matches!(
            fx.consultations.create(&fx.doctor, consultation_for(&fx, waiting.id)),
            Err(ClinicError::Validation(_))
        ));

        fx.appointments.set_status(waiting.id, AppointmentStatus::Confirmed).unwrap();
        fx.appointments.set_status(waiting.id, AppointmentStatus::InProgress).unwrap();
        fx.appointments.set_status(waiting.id, AppointmentStatus::Completed).unwrap();
        assert!(matches!(
            fx.consultations.create(&fx.doctor, consultation_for(&fx, waiting.id)),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_second_consultation_for_same_appointment_rejected() {
        let fx = fixture();
        let appt = booked_appointment(&fx, AppointmentStatus::Confirmed);

        fx.consultations
            .create(&fx.doctor, consultation_for(&fx, appt.id))
            .unwrap();
        let again = fx
            .consultations
            .create(&fx.doctor, consultation_for(&fx, appt.id));
        assert!(matches!(again, Err(ClinicError::Validation(_))));
    }

    #[test]
    fn test_only_the_assigned_doctor_may_record() {
        let fx = fixture();
        let appt = booked_appointment(&fx, AppointmentStatus::Confirmed);

        let other_doctor = Identity {
            user_id: Uuid::new_v4(),
            email: "other@clinic.com".into(),
            role: Role::Doctor,
            name: "Dr. Other".into(),
        };
        assert!(matches!(
            fx.consultations.create(&other_doctor, consultation_for(&fx, appt.id)),
            Err(ClinicError::Forbidden)
        ));

        let receptionist = Identity {
            user_id: fx.doctor.user_id,
            email: "reception@clinic.com".into(),
            role: Role::Receptionist,
            name: "Priya".into(),
        };
        assert!(matches!(
            fx.consultations.create(&receptionist, consultation_for(&fx, appt.id)),
            Err(ClinicError::Forbidden)
        ));
    }

    #[test]
    fn test_listing_filters_and_sorts_newest_first() {
        let fx = fixture();
        let first = booked_appointment(&fx, AppointmentStatus::Confirmed);
        fx.consultations
            .create(&fx.doctor, consultation_for(&fx, first.id))
            .unwrap();

        // Second visit in a different slot
        let second = fx
            .appointments
            .create(BookingRequest {
                patient_id: fx.patient,
                doctor_id: fx.doctor.user_id,
                date: "2026-03-02".parse().unwrap(),
                time_slot: TimeSlot::parse("04:00 PM").unwrap(),
                uploaded_files: Vec::new(),
                optional_record_data: None,
            })
            .unwrap();
        fx.appointments.set_status(second.id, AppointmentStatus::Confirmed).unwrap();
        fx.consultations
            .create(&fx.doctor, consultation_for(&fx, second.id))
            .unwrap();

        let all = fx.consultations.list_for(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at >= all[1].created_at);

        let for_patient = fx.consultations.list_for(Some(fx.patient)).unwrap();
        assert_eq!(for_patient.len(), 2);
        assert!(fx.consultations.list_for(Some(Uuid::new_v4())).unwrap().is_empty());

        let for_doctor = fx.consultations.list_for_doctor(fx.doctor.user_id).unwrap();
        assert_eq!(for_doctor.len(), 2);
        assert!(fx
            .consultations
            .list_for_doctor(Uuid::new_v4())
            .unwrap()
            .is_empty());
    }
}
