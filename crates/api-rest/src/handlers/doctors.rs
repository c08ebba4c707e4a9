//! Doctor directory, used by booking pickers.

use crate::error::ApiError;
use crate::session::require_identity;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/doctors",
    responses(
        (status = 200, description = "All doctor-role users, password material omitted"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Value>, ApiError> {
    require_identity(&jar, &state.cfg)?;

    let doctors: Vec<_> = state
        .users
        .list_doctors()?
        .iter()
        .map(|d| d.summary())
        .collect();
    Ok(Json(json!({ "doctors": doctors })))
}
