//! Handlers for the operation-timer endpoints consumed by the weighbridge stations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::models::{TimerStats, TimerView};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    pub timer_id: String,
    pub code_gen: String,
    pub shipment_id: i64,
    pub tipo_timer: String,
    #[serde(default)]
    pub tipo_unidad: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimerRequest {
    pub timer_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResult {
    pub timer_id: String,
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResult {
    pub shipment_id: i64,
    pub liberado: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveResult {
    pub timer_id: String,
    pub is_active: bool,
}

/// `POST /start` — arms (or re-arms) a station's timer for a shipment.
pub async fn start_timer(
    State(state): State<AppState>,
    Json(body): Json<StartTimerRequest>,
) -> Result<Json<ApiResponse<TimerView>>, ApiError> {
    let timer = state
        .registry
        .start_timer(
            &body.timer_id,
            &body.code_gen,
            body.shipment_id,
            &body.tipo_timer,
            &body.tipo_unidad,
        )
        .await?;
    Ok(Json(ApiResponse::ok(
        "Cronómetro iniciado",
        TimerView::from(&timer),
    )))
}

/// `POST /stop` — stops a timer; a missing timer is reported, not an error.
pub async fn stop_timer(
    State(state): State<AppState>,
    Json(body): Json<StopTimerRequest>,
) -> Result<Json<ApiResponse<StopResult>>, ApiError> {
    let stopped = state.registry.stop_timer(&body.timer_id).await?;
    let message = if stopped {
        "Cronómetro detenido"
    } else {
        "Cronómetro no encontrado"
    };
    Ok(Json(ApiResponse::ok(
        message,
        StopResult {
            timer_id: body.timer_id,
            stopped,
        },
    )))
}

/// `GET /active/:tipo_timer` — every running timer in a category.
pub async fn active_timers(
    State(state): State<AppState>,
    Path(tipo_timer): Path<String>,
) -> Result<Json<ApiResponse<Vec<TimerView>>>, ApiError> {
    let timers = state.registry.active_timers(&tipo_timer).await?;
    let views: Vec<TimerView> = timers.iter().map(TimerView::from).collect();
    Ok(Json(ApiResponse::ok("Cronómetros activos", views)))
}

/// `GET /:timer_id` — point lookup; 404 with the envelope when absent.
pub async fn get_timer(
    State(state): State<AppState>,
    Path(timer_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.registry.get_timer(&timer_id).await? {
        Some(timer) => Ok(Json(ApiResponse::ok(
            "Cronómetro encontrado",
            TimerView::from(&timer),
        ))
        .into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure("Cronómetro no encontrado")),
        )
            .into_response()),
    }
}

/// `GET /:timer_id/active` — cheap liveness probe for a timer id.
pub async fn timer_active(
    State(state): State<AppState>,
    Path(timer_id): Path<String>,
) -> Result<Json<ApiResponse<ActiveResult>>, ApiError> {
    let is_active = state.registry.is_timer_active(&timer_id).await?;
    Ok(Json(ApiResponse::ok(
        "Estado del cronómetro",
        ActiveResult {
            timer_id,
            is_active,
        },
    )))
}

/// `POST /liberar/:shipment_id` — releases everything tracked for a shipment.
/// Always answers 200; redundant calls simply report `liberado: false`.
pub async fn release_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<i64>,
) -> Result<Json<ApiResponse<ReleaseResult>>, ApiError> {
    let liberado = state.registry.release_by_shipment(shipment_id).await?;
    let message = if liberado {
        "Envío liberado"
    } else {
        "No había nada que liberar"
    };
    Ok(Json(ApiResponse::ok(
        message,
        ReleaseResult {
            shipment_id,
            liberado,
        },
    )))
}

/// `GET /stats` — aggregate counts over the active timer table.
pub async fn timer_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TimerStats>>, ApiError> {
    let stats = state.registry.stats().await?;
    Ok(Json(ApiResponse::ok("Estadísticas de cronómetros", stats)))
}
