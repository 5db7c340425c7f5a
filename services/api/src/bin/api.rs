//! services/api/src/bin/api.rs

use api_lib::{
    adapters::JsonFileStore,
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use catalog_core::service::CatalogService;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Catalog ---
    let store = Arc::new(JsonFileStore::new(config.catalog_path.clone()));
    info!("Catalog file: {}", store.path().display());
    let catalog = Arc::new(CatalogService::new(store));

    // --- 3. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState {
        catalog,
        config: config.clone(),
    });
    let app = build_router(app_state);

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
