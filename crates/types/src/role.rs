use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing roles or genders from text.
#[derive(Debug, thiserror::Error)]
pub enum RoleParseError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown gender: {0}")]
    UnknownGender(String),
}

/// The role attached to a user account.
///
/// Determines which data a caller can see and which operations they may
/// perform. Authorization decisions live in the API layer; this type only
/// answers coarse capability questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Patient,
}

impl Role {
    /// Staff roles see every patient and may register patients at the
    /// front desk. Patients only ever see their own linked profile.
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Patient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            "patient" => Ok(Role::Patient),
            other => Err(RoleParseError::UnknownRole(other.to_owned())),
        }
    }
}

/// Patient gender as recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            unknown => Err(RoleParseError::UnknownGender(unknown.to_owned())),
        }
    }
}
