//! # HTTP Surface
//!
//! The endpoints the weighbridge stations poll and mutate through. Every
//! response uses the uniform `{success, message, data}` envelope.

pub mod envelope;
pub mod timer_handlers;
pub mod bay_handlers;

pub use envelope::*;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::services::{BayAllocator, TemperatureService, TimerRegistry};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TimerRegistry>,
    pub allocator: Arc<BayAllocator>,
    pub temperature: Arc<TemperatureService>,
    /// Timer category used when a reorganize request does not name one
    pub default_timer_category: String,
}

/// Builds the application router. Static segments win over the timer-id
/// captures, so `/stats`, `/active/...` and `/piletas/...` stay reachable.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(timer_handlers::start_timer))
        .route("/stop", post(timer_handlers::stop_timer))
        .route("/active/:tipo_timer", get(timer_handlers::active_timers))
        .route("/stats", get(timer_handlers::timer_stats))
        .route("/liberar/:shipment_id", post(timer_handlers::release_shipment))
        .route("/piletas", get(bay_handlers::bay_state))
        .route("/piletas/reorganizar", post(bay_handlers::reorganize))
        .route("/piletas/temperatura", post(bay_handlers::record_temperature))
        .route("/:timer_id", get(timer_handlers::get_timer))
        .route("/:timer_id/active", get(timer_handlers::timer_active))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
