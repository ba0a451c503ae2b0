use std::sync::Arc;
use anyhow::Result;
use tracing::info;
use tokio::signal::ctrl_c;
use piletas_sync::api::{self, AppState};
use piletas_sync::config::Settings;
use piletas_sync::repositories::BayRepository;
use piletas_sync::services::db::DatabaseService;
use piletas_sync::services::{
    BayAllocator, ShippingApiClient, TemperatureGate, TemperatureService, TimerRegistry,
};
use piletas_sync::utils::logging;

/// The main entry point of the piletas-sync service
///
/// This function initializes the application, sets up logging, creates the services,
/// and serves the HTTP surface until a shutdown signal is received
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}


/// The core logic of the piletas-sync service
///
/// This asynchronous function performs the following steps:
/// 1. Loads application settings from configuration files
/// 2. Initializes the logging system
/// 3. Connects to the database and provisions the fixed bay rows
/// 4. Creates the `ShippingApiClient`, `TimerRegistry`, `BayAllocator` and `TemperatureService`
/// 5. Builds the router and serves it until a shutdown signal is received
///
/// # Returns
///
/// * `Ok(())` if the application runs successfully and shuts down gracefully
/// * `Err(anyhow::Error)` if any errors occur during initialization or serving
async fn run() -> Result<()> {
    let settings = Settings::new()?;
    let log_file_path = settings.logging.path.clone();
    let _guard = logging::init_logger(log_file_path)?;

    let settings = Arc::new(settings);
    let db_service = DatabaseService::new(Arc::clone(&settings)).await?;

    let bay_numbers = settings.bay_numbers();
    db_service.bays().ensure_bays(&bay_numbers).await?;
    info!("Provisioned {} cooling bay(s)", bay_numbers.len());

    let shipping = Arc::new(ShippingApiClient::new(&settings.shipping_api)?);

    let registry = Arc::new(TimerRegistry::new(
        Arc::new(db_service.timers()),
        Arc::new(db_service.display_orders()),
        settings.piletas.utc_offset_minutes,
    ));
    let allocator = Arc::new(BayAllocator::new(
        Arc::new(db_service.bays()),
        Arc::new(db_service.display_orders()),
        Arc::clone(&shipping),
    ));
    let temperature = Arc::new(TemperatureService::new(
        TemperatureGate::new(&settings.piletas),
        Arc::clone(&shipping),
    ));

    let state = AppState {
        registry,
        allocator,
        temperature,
        default_timer_category: settings.piletas.default_timer_category.clone(),
    };
    let app = api::router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = ctrl_c().await;
            info!("Received shutdown signal. Shutting down gracefully...");
        })
        .await?;

    Ok(())
}
