mod activities;
mod api;
mod app;
mod config;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::sync::Arc;

use services::{ActivityServiceClient, ActivitySource, ExportServiceClient, ExportSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        locale = ?settings.number_locale,
        default_page_size = settings.default_page_size,
        "Starting obras-atividades"
    );

    let activity_client = ActivityServiceClient::new(
        settings.activity_service_url.clone(),
        settings.activity_service_timeout_seconds,
        settings.activity_service_max_retry_seconds,
    )?;
    let export_client = ExportServiceClient::new(
        settings.export_service_url.clone(),
        settings.export_service_timeout_seconds,
    )?;

    // Probe upstreams without blocking startup
    tokio::spawn({
        let activity_client = activity_client.clone();
        async move {
            match activity_client.health_check().await {
                Ok(()) => tracing::info!("ActivityService is healthy"),
                Err(e) => tracing::warn!(error = %e, "ActivityService health check failed - will retry on first request"),
            }
        }
    });

    let activities: Arc<dyn ActivitySource> = Arc::new(activity_client);
    let exports: Arc<dyn ExportSink> = Arc::new(export_client);

    // Create application state
    let state = app::AppState::new(settings.clone(), activities, exports);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
