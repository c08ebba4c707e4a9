//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST
//! server (with OpenAPI/Swagger UI). The workspace's main `clinic-run`
//! binary is the deployment entrypoint.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::{secure_cookies_from_env_value, CoreConfig, DEFAULT_DATA_DIR};

/// Main entry point for the clinic REST API server.
///
/// # Environment Variables
/// - `CLINIC_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Document store directory (default: "clinic_data")
/// - `CLINIC_TOKEN_SECRET`: Session signing secret (required)
/// - `CLINIC_SECURE_COOKIES`: Set to `1` to mark the session cookie `Secure`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the token secret is missing or empty, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let token_secret = std::env::var("CLINIC_TOKEN_SECRET")
        .map_err(|_| anyhow::anyhow!("CLINIC_TOKEN_SECRET must be set"))?;
    let secure_cookies =
        secure_cookies_from_env_value(std::env::var("CLINIC_SECURE_COOKIES").ok());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(data_dir),
        token_secret,
        secure_cookies,
    )?);

    tracing::info!("-- Starting clinic REST API on {}", addr);

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
