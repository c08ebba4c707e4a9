use serde::Serialize;
use utoipa::ToSchema;

/// Health check response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by every API surface.
///
/// Provides a standardised way to check liveness of the clinic backend.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "clinic backend is alive".into(),
        }
    }
}
