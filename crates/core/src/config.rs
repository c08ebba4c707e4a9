//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses. Binaries read
//! the environment themselves and hand the values in.

use crate::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    token_secret: String,
    secure_cookies: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if the token secret is empty or
    /// whitespace — a blank signing key would make every session forgeable.
    pub fn new(
        data_dir: PathBuf,
        token_secret: String,
        secure_cookies: bool,
    ) -> ClinicResult<Self> {
        if token_secret.trim().is_empty() {
            return Err(ClinicError::Validation(
                "token secret cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            token_secret,
            secure_cookies,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    /// Whether the session cookie carries the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// Parse the secure-cookie flag from an optional env value.
///
/// Anything other than an explicit opt-in (`1`, `true`, `yes`) leaves the
/// cookie non-secure, which is what local development over plain HTTP needs.
pub fn secure_cookies_from_env_value(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("yes")
    )
}
