//! Handlers for the cooling-bay endpoints: bay state, reorganization, and the
//! temperature gate.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::envelope::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::errors::PiletasError;
use crate::models::{BayView, QueuePositionView, TemperatureOrigin};
use crate::services::TemperatureOutcome;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorganizeRequest {
    #[serde(default)]
    pub tipo_timer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRequest {
    pub code_gen: String,
    pub temperatura: f64,
    pub origen: String,
}

/// `GET /piletas` — the current bay table, served without the reorganize guard.
pub async fn bay_state(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BayView>>>, ApiError> {
    let bays = state.allocator.current_bays().await?;
    let views: Vec<BayView> = bays.iter().map(BayView::from).collect();
    Ok(Json(ApiResponse::ok("Estado de piletas", views)))
}

/// `POST /piletas/reorganizar` — pulls the tracked shipments from the Shipping
/// API and reassigns bays and display ordering.
pub async fn reorganize(
    State(state): State<AppState>,
    body: Option<Json<ReorganizeRequest>>,
) -> Result<Json<ApiResponse<Vec<QueuePositionView>>>, ApiError> {
    let tipo_timer = body
        .and_then(|Json(b)| b.tipo_timer)
        .unwrap_or_else(|| state.default_timer_category.clone());
    let ordering = state.allocator.reorganize_from_api(&tipo_timer).await?;
    let views: Vec<QueuePositionView> = ordering.iter().map(QueuePositionView::from).collect();
    Ok(Json(ApiResponse::ok("Piletas reorganizadas", views)))
}

/// `POST /piletas/temperatura` — records a reading and routes the shipment.
///
/// A push failure after a recorded reading still answers 200 with the partial
/// outcome in `data`; the message carries the upstream complaint so the station
/// operator sees both facts.
pub async fn record_temperature(
    State(state): State<AppState>,
    Json(body): Json<TemperatureRequest>,
) -> Result<Json<ApiResponse<TemperatureOutcome>>, ApiError> {
    let origin = TemperatureOrigin::parse(&body.origen).ok_or_else(|| {
        PiletasError::ValidationError(format!(
            "origen '{}' inválido; se espera 'queue' o 'cooling'",
            body.origen
        ))
    })?;

    let outcome = state
        .temperature
        .record_and_route(&body.code_gen, body.temperatura, origin)
        .await?;

    let message = if outcome.transition_pushed {
        outcome.message.clone()
    } else {
        format!(
            "Temperatura registrada, pero el cambio de estado falló: {}",
            outcome
                .push_error
                .clone()
                .unwrap_or_else(|| "error desconocido".to_string())
        )
    };
    Ok(Json(ApiResponse::ok(message, outcome)))
}
