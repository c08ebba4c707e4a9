//! Demo data seeding endpoint, for first-run and demo environments.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use clinic_core::seed::seed_demo_data;
use serde_json::{json, Value};

#[utoipa::path(
    post,
    path = "/seed",
    responses((status = 200, description = "Demo accounts ensured; one result line per account"))
)]
/// Idempotently creates the four demo accounts and the demo patient.
pub async fn run(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let results = seed_demo_data(&state.users, &state.patients)?;
    Ok(Json(json!({ "success": true, "results": results })))
}
