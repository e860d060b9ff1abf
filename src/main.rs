use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use synopsis_core::config::config_from_env;

/// Main entry point for the synopsis application
///
/// Loads `.env`, resolves the core configuration once and serves the REST API (with Swagger UI
/// at `/swagger-ui`).
///
/// # Environment Variables
/// - `SYNOPSIS_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `SYNOPSIS_DATA_DIR`: Directory for generated artifacts (default: "data")
/// - `DATABASE_URL`: Research cache (default: "sqlite://research.db?mode=rwc")
/// - `GROQ_API_KEY`: Completion API key; drafting is disabled without it
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synopsis_run=info".parse()?)
                .add_directive("synopsis_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("SYNOPSIS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let cfg = Arc::new(config_from_env()?);
    tracing::info!("++ Artifacts in {}", cfg.data_dir().display());

    let state = AppState::from_config(cfg).await?;

    tracing::info!("++ Starting synopsis REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
