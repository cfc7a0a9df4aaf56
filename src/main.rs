use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, core_config_from_env, router};
use medintel_core::{DecisionService, InMemoryRecordStore};

/// Main entry point for the MedIntel application
///
/// Loads configuration, makes sure a diagnostic model is available (loading the stored artifact
/// or training and saving a new one), then serves the REST API.
///
/// Startup fails fast: invalid reference data, an unusable model path or a failed training run
/// stop the process before any request is accepted.
///
/// # Environment Variables
/// - `MEDINTEL_REST_ADDR`: REST server address (default: "0.0.0.0:5000")
/// - `MEDINTEL_MODEL_PATH`: model artifact path (default: "models/diagnostic_model.json")
/// - `MEDINTEL_REFERENCE_DATA`: reference data YAML override (default: embedded tables)
/// - `MEDINTEL_MODEL_SEED`: training seed (default: 42)
/// - `MEDINTEL_MODEL_TREES`: number of trees (default: 100)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medintel_run=info".parse()?)
                .add_directive("medintel_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDINTEL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".into());

    let cfg = core_config_from_env()?;
    let service = DecisionService::new(&cfg)?;

    let init = service.clone();
    let classifier = tokio::task::spawn_blocking(move || init.initialise()).await??;
    tracing::info!(
        "++ Diagnostic model ready: {} symptoms, {} conditions",
        classifier.symptoms().len(),
        classifier.conditions().len()
    );

    tracing::info!("++ Starting MedIntel REST on {}", rest_addr);

    let app = router(AppState::new(service, Arc::new(InMemoryRecordStore::new())));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
