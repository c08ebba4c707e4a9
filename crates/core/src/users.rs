//! Credential store.
//!
//! Persists user identities (staff and patients alike) with a bcrypt
//! password hash. The plaintext password exists only transiently inside
//! [`CredentialService::create`]; the stored document and every outward
//! serialization carry the hash or nothing.

use crate::store::{Collection, SharedDatabase};
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Utc};
use clinic_types::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// bcrypt work factor used for new accounts.
pub const BCRYPT_COST: u32 = 12;

/// A stored user identity. `password_hash` never leaves the backend;
/// outward paths convert to [`UserSummary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lowercased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Doctors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            mobile: self.mobile.clone(),
            specialization: self.specialization.clone(),
        }
    }
}

/// The outward-facing projection of a user. No password material.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

/// Fields for a new account. Carries the plaintext password; hash it by
/// passing this straight to [`CredentialService::create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub mobile: Option<String>,
    pub specialization: Option<String>,
}

/// Operations over stored user identities.
#[derive(Clone)]
pub struct CredentialService {
    db: SharedDatabase,
}

impl CredentialService {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Looks a user up by email, lowercasing the needle first.
    pub fn find_by_email(&self, email: &str) -> ClinicResult<Option<User>> {
        let needle = email.trim().to_lowercase();
        let users: Vec<User> = self.db.get()?.list(Collection::Users)?;
        Ok(users.into_iter().find(|u| u.email == needle))
    }

    /// Looks a user up by internal identifier.
    pub fn find_by_id(&self, id: Uuid) -> ClinicResult<Option<User>> {
        self.db.get()?.get(Collection::Users, id)
    }

    /// Creates an account, hashing the password at cost factor 12.
    ///
    /// # Errors
    ///
    /// - `ClinicError::Validation` when name, email, or password is blank
    /// - `ClinicError::DuplicateEmail` when the email is already taken
    pub fn create(&self, new: NewUser) -> ClinicResult<User> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() || new.password.is_empty() {
            return Err(ClinicError::Validation(
                "name, email and password are required".into(),
            ));
        }

        let email = new.email.trim().to_lowercase();
        let password_hash =
            bcrypt::hash(&new.password, BCRYPT_COST).map_err(ClinicError::PasswordHash)?;

        let db = self.db.get()?;
        db.with_collection_lock(Collection::Users, || {
            let users: Vec<User> = db.list(Collection::Users)?;
            if users.iter().any(|u| u.email == email) {
                return Err(ClinicError::DuplicateEmail);
            }

            let user = User {
                id: Uuid::new_v4(),
                name: new.name.trim().to_owned(),
                email,
                password_hash,
                role: new.role,
                mobile: new.mobile.clone(),
                specialization: new.specialization.clone(),
                created_at: Utc::now(),
            };
            db.put(Collection::Users, user.id, &user)?;
            tracing::info!(user = %user.id, role = %user.role, "user created");
            Ok(user)
        })
    }

    /// Checks a login attempt.
    ///
    /// Returns `Ok(None)` both when the email is unknown and when the
    /// password does not match — the two causes are indistinguishable to
    /// the caller, which prevents account enumeration.
    pub fn authenticate(&self, email: &str, password: &str) -> ClinicResult<Option<User>> {
        let Some(user) = self.find_by_email(email)? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// All users with the doctor role, for booking pickers.
    pub fn list_doctors(&self) -> ClinicResult<Vec<User>> {
        let users: Vec<User> = self.db.get()?.list(Collection::Users)?;
        let mut doctors: Vec<User> = users
            .into_iter()
            .filter(|u| u.role == Role::Doctor)
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }
}

/// Compares a plaintext password against a stored bcrypt hash.
///
/// An unparseable hash counts as a mismatch rather than an error; a
/// corrupted credential document should fail login, not take the whole
/// request down.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
