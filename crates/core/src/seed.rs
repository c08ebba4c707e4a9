//! Demo data seeding.
//!
//! Creates the four demo accounts (one per role) and one demo patient
//! profile linked to the demo patient account. Safe to run repeatedly:
//! existing accounts are skipped and reported, never duplicated.

use crate::patients::{NewPatient, PatientService};
use crate::users::{CredentialService, NewUser};
use crate::ClinicResult;
use clinic_types::{Gender, Role};

struct DemoAccount {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    mobile: Option<&'static str>,
    specialization: Option<&'static str>,
}

const DEMO_ACCOUNTS: [DemoAccount; 4] = [
    DemoAccount {
        name: "Dr. Sree Ram (Admin)",
        email: "admin@clinic.com",
        password: "admin123",
        role: Role::Admin,
        mobile: None,
        specialization: None,
    },
    DemoAccount {
        name: "Dr. Sree Ram",
        email: "doctor@clinic.com",
        password: "doctor123",
        role: Role::Doctor,
        mobile: None,
        specialization: Some("General Medicine"),
    },
    DemoAccount {
        name: "Priya Sharma",
        email: "reception@clinic.com",
        password: "reception123",
        role: Role::Receptionist,
        mobile: Some("9876543210"),
        specialization: None,
    },
    DemoAccount {
        name: "Amit Patel",
        email: "patient@clinic.com",
        password: "patient123",
        role: Role::Patient,
        mobile: Some("9123456780"),
        specialization: None,
    },
];

/// Seeds the demo accounts and demo patient. Returns one human-readable
/// line per account describing what happened.
pub fn seed_demo_data(
    users: &CredentialService,
    patients: &PatientService,
) -> ClinicResult<Vec<String>> {
    let mut results = Vec::new();

    for account in &DEMO_ACCOUNTS {
        if users.find_by_email(account.email)?.is_some() {
            results.push(format!("Skipped {} - already exists", account.email));
            continue;
        }

        let user = users.create(NewUser {
            name: account.name.into(),
            email: account.email.into(),
            password: account.password.into(),
            role: account.role,
            mobile: account.mobile.map(Into::into),
            specialization: account.specialization.map(Into::into),
        })?;
        results.push(format!("Created {}: {}", account.role, account.email));

        // The demo patient account gets a linked profile.
        if account.role == Role::Patient && patients.find_by_user(user.id)?.is_none() {
            let patient = patients.create(NewPatient {
                name: account.name.into(),
                age: 35,
                gender: Gender::Male,
                mobile: account.mobile.unwrap_or_default().into(),
                address: Some("12 MG Road, Mumbai".into()),
                user_id: Some(user.id),
            })?;
            results.push(format!("Created demo patient: {}", patient.patient_id));
        }
    }

    Ok(results)
}
