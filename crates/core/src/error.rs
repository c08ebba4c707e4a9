/// Errors raised by clinic domain operations.
///
/// Split along the lines the API layer cares about: caller faults
/// (`Unauthorized`..`SlotUnavailable`) map to 4xx responses with their
/// display text, storage faults map to a logged 500 with a generic
/// user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("An account with this email already exists")]
    DuplicateEmail,
    #[error("{0}")]
    Validation(String),
    #[error("This time slot is no longer available")]
    SlotUnavailable,
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to process password: {0}")]
    PasswordHash(bcrypt::BcryptError),
}

impl ClinicError {
    /// Whether this error is an internal fault whose detail must not be
    /// shown to the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ClinicError::StorageDirCreation(_)
                | ClinicError::FileRead(_)
                | ClinicError::FileWrite(_)
                | ClinicError::Serialization(_)
                | ClinicError::Deserialization(_)
                | ClinicError::PasswordHash(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
