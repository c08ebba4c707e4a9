use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::{secure_cookies_from_env_value, CoreConfig, DEFAULT_DATA_DIR};

/// Main entry point for the clinic backend.
///
/// Resolves configuration from the environment once, then serves the
/// REST API (with OpenAPI/Swagger UI) on the configured address.
///
/// # Environment Variables
/// - `CLINIC_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Document store directory (default: "clinic_data")
/// - `CLINIC_TOKEN_SECRET`: Session signing secret (required)
/// - `CLINIC_SECURE_COOKIES`: Set to `1` to mark the session cookie `Secure`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration or startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?)
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

    tracing::info!("++ Starting clinic backend on {}", addr);
    tracing::info!("++ Document store at {}", cfg.data_dir().display());

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
