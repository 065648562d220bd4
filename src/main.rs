// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::export_selector::ExportSelector;
use crate::application::forecast_cache::ForecastCache;
use crate::application::forecast_refresh::{RefreshConfig, RefreshCycle, RefreshTrigger};
use crate::application::reading_repository::ReadingRepository;
use crate::infrastructure::config::{load_settings, StoreBackend};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::infrastructure::memory_repository::MemoryRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn ReadingRepository> = match (settings.store.backend, settings.influx.clone()) {
        (StoreBackend::Influx, Some(influx)) => {
            tracing::info!("Using InfluxDB reading store at {}", influx.host);
            Arc::new(InfluxRepository::new(influx, settings.store.timeout())?)
        }
        (StoreBackend::Influx, None) => anyhow::bail!("influx backend selected without [influx] settings"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("Using in-memory reading store; readings are lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    // Forecast cache and its refresh cycle
    let forecast_cache = Arc::new(ForecastCache::new());
    let refresh_trigger = RefreshTrigger::default();
    let refresh_cycle = RefreshCycle::new(
        repository.clone(),
        forecast_cache.clone(),
        RefreshConfig {
            interval: Duration::from_secs(settings.forecast.refresh_interval_secs),
            min_points: settings.forecast.min_points,
            store_timeout: settings.store.timeout(),
        },
        refresh_trigger.clone(),
    );

    // Initial refresh before serving, then keep it fresh in the background
    refresh_cycle.refresh_logged().await;
    tokio::spawn(refresh_cycle.run());

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service: DashboardService::new(repository.clone(), refresh_trigger),
        export_selector: ExportSelector::new(repository),
        forecast_cache,
        pagination: settings.pagination.clone(),
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = settings.bind_addr()?;
    tracing::info!("Starting student-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
