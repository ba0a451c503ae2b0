//! # Shipping API Data Structures
//!
//! This module defines data structures that represent information from the external
//! Shipping API. The upstream payloads are decoded defensively: every field the core
//! does not strictly own is optional, and records that cannot be turned into a usable
//! snapshot are skipped (and logged) instead of failing the whole page.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{LifecycleStatus, ShipmentSnapshot};

const ARRIVAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One page of a paginated shipment listing (`GET shipping/status/{n}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingPage {
    #[serde(default)]
    pub data: Vec<ShippingRecord>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl ShippingPage {
    /// Whether a further page exists after this one.
    pub fn has_next(&self) -> bool {
        match (self.current_page, self.last_page) {
            (Some(current), Some(last)) => current < last,
            _ => false,
        }
    }
}

/// One shipment record as listed by the Shipping API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub code_gen: Option<String>,
    #[serde(default)]
    pub tipo_unidad: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    /// Arrival timestamp as formatted by the upstream ("%Y-%m-%d %H:%M:%S")
    #[serde(default)]
    pub fecha_ingreso: Option<String>,
}

impl ShippingRecord {
    /// Converts the record into an allocation snapshot, or `None` (with a warning)
    /// when a field the allocator depends on is missing or malformed.
    pub fn to_snapshot(&self) -> Option<ShipmentSnapshot> {
        let id = self.id?;
        let code_gen = self.code_gen.clone()?;
        let status = self.status.and_then(LifecycleStatus::from_code)?;
        let arrived_at = match self
            .fecha_ingreso
            .as_deref()
            .map(|raw| NaiveDateTime::parse_from_str(raw, ARRIVAL_FORMAT))
        {
            Some(Ok(at)) => at,
            Some(Err(e)) => {
                warn!(
                    "Skipping shipment {}: unparseable arrival '{:?}': {}",
                    id, self.fecha_ingreso, e
                );
                return None;
            }
            None => {
                warn!("Skipping shipment {}: no arrival timestamp", id);
                return None;
            }
        };
        Some(ShipmentSnapshot {
            shipment_id: id,
            code_gen,
            unit_type: self.tipo_unidad.clone().unwrap_or_else(|| "P".to_string()),
            lifecycle_status: status,
            arrived_at,
        })
    }
}

/// Body of `POST status/push`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPushRequest {
    pub code_gen: String,
    pub status: i32,
}

/// Body of `POST shipping/temperatura/{codeGen}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureReadingRequest {
    pub temperatura: f64,
}

/// Body of `POST operation-times`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationTimeRequest {
    pub code_gen: String,
    pub tipo_timer: String,
    pub elapsed_seconds: i64,
}

/// Response of the queue-count endpoint (`GET queue/count`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueCountResponse {
    #[serde(default)]
    pub count: Option<u32>,
}

/// The error envelope the upstream emits on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_all_fields_becomes_a_snapshot() {
        let record = ShippingRecord {
            id: Some(7),
            code_gen: Some("TRX-7".to_string()),
            tipo_unidad: Some("B".to_string()),
            status: Some(7),
            fecha_ingreso: Some("2024-06-01 08:15:00".to_string()),
        };
        let snapshot = record.to_snapshot().expect("complete record");
        assert_eq!(snapshot.shipment_id, 7);
        assert_eq!(snapshot.lifecycle_status, LifecycleStatus::Queued);
        assert_eq!(snapshot.unit_type, "B");
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let missing_id = ShippingRecord {
            code_gen: Some("TRX-1".to_string()),
            status: Some(7),
            fecha_ingreso: Some("2024-06-01 08:15:00".to_string()),
            ..Default::default()
        };
        assert!(missing_id.to_snapshot().is_none());

        let bad_arrival = ShippingRecord {
            id: Some(2),
            code_gen: Some("TRX-2".to_string()),
            status: Some(8),
            fecha_ingreso: Some("junio 1".to_string()),
            ..Default::default()
        };
        assert!(bad_arrival.to_snapshot().is_none());

        let unknown_status = ShippingRecord {
            id: Some(3),
            code_gen: Some("TRX-3".to_string()),
            status: Some(99),
            fecha_ingreso: Some("2024-06-01 08:15:00".to_string()),
            ..Default::default()
        };
        assert!(unknown_status.to_snapshot().is_none());
    }

    #[test]
    fn pagination_detection_is_defensive() {
        let mid = ShippingPage {
            current_page: Some(1),
            last_page: Some(3),
            ..Default::default()
        };
        assert!(mid.has_next());

        let last = ShippingPage {
            current_page: Some(3),
            last_page: Some(3),
            ..Default::default()
        };
        assert!(!last.has_next());

        let unknown = ShippingPage::default();
        assert!(!unknown.has_next());
    }
}
