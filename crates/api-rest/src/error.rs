//! Uniform error responses.
//!
//! Every failing endpoint returns `{"error": "..."}` with an appropriate
//! status code. Internal faults are logged with their cause and surfaced
//! as a generic message; caller faults carry their display text.

use api_shared::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinic_core::ClinicError;
use serde_json::json;

/// An error ready to be rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "storage failure");
            return ApiError::internal();
        }

        let status = match &err {
            ClinicError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClinicError::Forbidden => StatusCode::FORBIDDEN,
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::DuplicateEmail | ClinicError::SlotUnavailable => StatusCode::CONFLICT,
            ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
            // is_internal() covered everything else above
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => ApiError::unauthorized(),
            AuthError::Signing(_) | AuthError::Clock => {
                tracing::error!(error = %err, "credential signing failure");
                ApiError::internal()
            }
        }
    }
}
