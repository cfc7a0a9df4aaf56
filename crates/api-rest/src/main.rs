//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you want the REST server without the workspace's
//! `medintel-run` startup checks. The classifier is loaded or trained on the first diagnosis
//! rather than at startup.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};
use medintel_core::{DecisionService, InMemoryRecordStore};

/// Main entry point for the MedIntel REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:5000).
/// Provides HTTP endpoints for diagnosis and medication screening with OpenAPI/Swagger
/// documentation.
///
/// # Environment Variables
/// - `MEDINTEL_REST_ADDR`: Server address (default: "0.0.0.0:5000")
/// - `MEDINTEL_MODEL_PATH`, `MEDINTEL_REFERENCE_DATA`, `MEDINTEL_MODEL_SEED`,
///   `MEDINTEL_MODEL_TREES`: see [`core_config_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or reference data is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medintel_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDINTEL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());

    tracing::info!("-- Starting MedIntel REST API on {}", addr);

    let cfg = core_config_from_env()?;
    let service = DecisionService::new(&cfg)?;
    let state = AppState::new(service, Arc::new(InMemoryRecordStore::new()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
