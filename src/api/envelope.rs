//! The uniform `{success, message, data}` envelope every endpoint answers with,
//! and the mapping from internal error outcomes onto it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::errors::PiletasError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Wrapper turning a `PiletasError` into the envelope with the right status code.
///
/// Validation faults are the caller's (400), point-lookup misses are 404, a lost
/// bay race is 409, upstream Shipping API trouble is reported as a soft failure
/// on a 200 so the station UI can show the upstream message, and anything else
/// (the store being unavailable, serialization) is a hard 500.
pub struct ApiError(pub PiletasError);

impl From<PiletasError> for ApiError {
    fn from(err: PiletasError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PiletasError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            PiletasError::TimerNotFound(_) => {
                (StatusCode::NOT_FOUND, "Cronómetro no encontrado".to_string())
            }
            PiletasError::BayConflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            PiletasError::ShippingApiError { message, .. } => (StatusCode::OK, message.clone()),
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servicio".to_string(),
                )
            }
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}
