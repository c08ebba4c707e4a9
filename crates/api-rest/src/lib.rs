//! # API REST
//!
//! REST API for the clinic backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Session cookie plumbing (issue on login/register, verify everywhere)
//! - Role-based authorization at the handler boundary
//! - Uniform `{"error": ...}` failure bodies
//! - OpenAPI/Swagger documentation
//!
//! Domain logic lives in `clinic-core`; this crate only translates HTTP
//! into identity-scoped service calls and back.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;
pub mod session;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{HealthRes, HealthService};
use clinic_core::{
    AppointmentService, ConsultationService, CoreConfig, CredentialService, PatientService,
    SharedDatabase,
};

/// Application state shared across REST API handlers.
///
/// Holds the startup-resolved configuration and one instance of each
/// domain service, all backed by the same lazily-connected store.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub users: CredentialService,
    pub patients: PatientService,
    pub appointments: AppointmentService,
    pub consultations: ConsultationService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let db = SharedDatabase::new(cfg.data_dir().to_path_buf());
        Self {
            users: CredentialService::new(db.clone()),
            patients: PatientService::new(db.clone()),
            appointments: AppointmentService::new(db.clone()),
            consultations: ConsultationService::new(db),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::patients::list,
        handlers::patients::create,
        handlers::patients::update,
        handlers::doctors::list,
        handlers::appointments::list,
        handlers::appointments::create,
        handlers::appointments::slots,
        handlers::appointments::set_status,
        handlers::consultations::list,
        handlers::consultations::create,
        handlers::seed::run,
    ),
    components(schemas(
        HealthRes,
        handlers::auth::LoginReq,
        handlers::auth::RegisterReq,
        handlers::patients::CreatePatientReq,
        handlers::patients::UpdatePatientReq,
        handlers::appointments::BookAppointmentReq,
        handlers::appointments::StatusUpdateReq,
        handlers::consultations::CreateConsultationReq,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/patients",
            get(handlers::patients::list)
                .post(handlers::patients::create)
                .patch(handlers::patients::update),
        )
        .route("/doctors", get(handlers::doctors::list))
        .route(
            "/appointments",
            get(handlers::appointments::list).post(handlers::appointments::create),
        )
        .route("/appointments/slots", get(handlers::appointments::slots))
        .route(
            "/appointments/:id/status",
            patch(handlers::appointments::set_status),
        )
        .route(
            "/consultations",
            get(handlers::consultations::list).post(handlers::consultations::create),
        )
        .route("/seed", post(handlers::seed::run))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
/// Health check endpoint, used by monitoring and load balancers.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[cfg(test)]
mod tests;
