//! # Clinic Core
//!
//! Core business logic for the clinic management backend.
//!
//! This crate contains the domain services and their persistence:
//! - Credential store, patient registry, appointment ledger, scheduling
//!   rules, and consultation ledger
//! - JSON document storage under the configured data directory
//! - Demo data seeding
//!
//! **No API concerns**: HTTP routing, cookies, and status-code mapping
//! belong in `api-rest`; session token handling lives in `api-shared`.
//! Domain operations take an explicit [`api_shared::Identity`] where the
//! caller matters, so authorization decisions are testable without an
//! HTTP layer.

pub mod appointments;
pub mod attachments;
pub mod config;
pub mod consultations;
pub mod error;
pub mod ids;
pub mod patients;
pub mod scheduling;
pub mod seed;
pub mod store;
pub mod users;

pub use appointments::{Appointment, AppointmentService, BookingRequest};
pub use attachments::UploadedFile;
pub use config::{secure_cookies_from_env_value, CoreConfig, DEFAULT_DATA_DIR};
pub use consultations::{Consultation, ConsultationService, NewConsultation};
pub use error::{ClinicError, ClinicResult};
pub use patients::{NewPatient, Patient, PatientService, PatientUpdate};
pub use store::{Collection, Database, SharedDatabase};
pub use users::{CredentialService, NewUser, User, UserSummary};
