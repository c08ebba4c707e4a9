//! Patient registry.
//!
//! Patient profiles are clinical-subject records, distinct from user
//! accounts. A profile optionally carries a weak back-reference to the
//! user account that registered it (self-service patients); front-desk
//! registrations have no linked account at all.
//!
//! Display codes (`PAT-001`, `PAT-002`, …) are assigned in creation order
//! under the collection write lock, so they stay unique and strictly
//! increasing within the process.

use crate::ids::{sequential_code, PATIENT_CODE_PREFIX};
use crate::store::{Collection, SharedDatabase};
use crate::{ClinicError, ClinicResult};
use chrono::{NaiveDate, Utc};
use clinic_types::Gender;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Address recorded when the caller leaves the field blank.
pub const ADDRESS_NOT_PROVIDED: &str = "Not provided";

/// A stored patient profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    /// Human-readable sequential code, e.g. `PAT-007`. Immutable.
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub mobile: String,
    pub address: String,
    pub registration_date: NaiveDate,
    /// Weak link to the user account for self-registered patients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Fields for a new profile. The identifier, code, and registration date
/// are assigned by the registry.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub mobile: String,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
}

/// The mutable field set for profile edits. Identifier and code are never
/// part of it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub mobile: Option<String>,
    pub address: Option<String>,
}

/// Operations over the patient registry.
///
/// Access policy (who may see or edit which profile) is enforced by the
/// API layer; the registry itself is policy-free.
#[derive(Clone)]
pub struct PatientService {
    db: SharedDatabase,
}

impl PatientService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Registers a profile, assigning the next sequential code and
    /// today's registration date.
    pub fn create(&self, new: NewPatient) -> ClinicResult<Patient> {
        if new.name.trim().is_empty() {
            return Err(ClinicError::Validation("patient name is required".into()));
        }
        if new.mobile.trim().is_empty() {
            return Err(ClinicError::Validation("mobile number is required".into()));
        }

        let db = self.db.get()?;
        db.with_collection_lock(Collection::Patients, || {
            let count = db.count(Collection::Patients)?;
            let patient = Patient {
                id: Uuid::new_v4(),
                patient_id: sequential_code(PATIENT_CODE_PREFIX, count + 1),
                name: new.name.trim().to_owned(),
                age: new.age,
                gender: new.gender,
                mobile: new.mobile.trim().to_owned(),
                address: new
                    .address
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or(ADDRESS_NOT_PROVIDED)
                    .to_owned(),
                registration_date: Utc::now().date_naive(),
                user_id: new.user_id,
            };
            db.put(Collection::Patients, patient.id, &patient)?;
            tracing::info!(patient = %patient.patient_id, "patient registered");
            Ok(patient)
        })
    }

    /// Applies a shallow merge of the mutable fields onto a profile.
    pub fn update(&self, id: Uuid, update: PatientUpdate) -> ClinicResult<Patient> {
        let db = self.db.get()?;
        db.with_collection_lock(Collection::Patients, || {
            let mut patient: Patient = db
                .get(Collection::Patients, id)?
                .ok_or(ClinicError::NotFound("patient"))?;

            if let Some(name) = update.name {
                if name.trim().is_empty() {
                    return Err(ClinicError::Validation("patient name is required".into()));
                }
                patient.name = name.trim().to_owned();
            }
            if let Some(age) = update.age {
                patient.age = age;
            }
            if let Some(gender) = update.gender {
                patient.gender = gender;
            }
            if let Some(mobile) = update.mobile {
                patient.mobile = mobile.trim().to_owned();
            }
            if let Some(address) = update.address {
                patient.address = address.trim().to_owned();
            }

            db.put(Collection::Patients, patient.id, &patient)?;
            Ok(patient)
        })
    }

    pub fn get(&self, id: Uuid) -> ClinicResult<Option<Patient>> {
        self.db.get()?.get(Collection::Patients, id)
    }

    /// Resolves the profile linked to a user account, the lookup behind
    /// every "my profile" path for patient-role callers.
    pub fn find_by_user(&self, user_id: Uuid) -> ClinicResult<Option<Patient>> {
        let patients: Vec<Patient> = self.db.get()?.list(Collection::Patients)?;
        Ok(patients.into_iter().find(|p| p.user_id == Some(user_id)))
    }

    /// Case-insensitive substring search on name, mobile, or code.
    pub fn search(&self, query: &str) -> ClinicResult<Vec<Patient>> {
        let q = query.trim().to_lowercase();
        let mut matches: Vec<Patient> = self
            .db
            .get()?
            .list::<Patient>(Collection::Patients)?
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&q)
                    || p.mobile.contains(&q)
                    || p.patient_id.to_lowercase().contains(&q)
            })
            .collect();
        matches.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
        Ok(matches)
    }

    /// Every profile, in code order.
    pub fn list_all(&self) -> ClinicResult<Vec<Patient>> {
        let mut patients: Vec<Patient> = self.db.get()?.list(Collection::Patients)?;
        patients.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
        Ok(patients)
    }
}
