//! # Cooling Bays
//!
//! This module defines the persisted shape of one physical cooling bay ("pileta") and the
//! snapshot of shipment data an allocation decision is made from. The bay-number domain is
//! fixed at configuration time and never grows or shrinks at runtime; a bay's assignment
//! fields are either all null (free) or all non-null (occupied).

use chrono::NaiveDateTime;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use sqlx_oldapi::FromRow;

use crate::models::LifecycleStatus;

/// One physical cooling bay out of the small fixed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BayAssignment {
    /// The bay number (identity, fixed domain 1..=bay_count)
    #[sqlx(rename = "BAY_NUMBER")]
    pub bay_number: i32,
    /// The shipment currently occupying the bay (if any)
    #[sqlx(rename = "SHIPMENT_ID")]
    pub shipment_id: Option<i64>,
    /// The occupying shipment's transaction code
    #[sqlx(rename = "CODE_GEN")]
    pub code_gen: Option<String>,
    /// When the current occupant was granted the bay
    #[sqlx(rename = "ASSIGNED_AT")]
    pub assigned_at: Option<NaiveDateTime>,
    /// A JSON snapshot of the occupying shipment's data at grant time
    #[sqlx(rename = "SHIPMENT_SNAPSHOT")]
    pub shipment_snapshot: Option<String>,
    /// The last time this row was touched
    #[sqlx(rename = "UPDATED_AT")]
    pub updated_at: NaiveDateTime,
}

impl BayAssignment {
    /// A bay with no occupant.
    pub fn free(bay_number: i32, updated_at: NaiveDateTime) -> Self {
        BayAssignment {
            bay_number,
            shipment_id: None,
            code_gen: None,
            assigned_at: None,
            shipment_snapshot: None,
            updated_at,
        }
    }

    pub fn is_free(&self) -> bool {
        self.shipment_id.is_none()
    }

    pub fn holds(&self, shipment_id: i64) -> bool {
        self.shipment_id == Some(shipment_id)
    }
}

/// The shipment data an allocation decision is made from, captured from the
/// Shipping API at reorganization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Constructor)]
pub struct ShipmentSnapshot {
    pub shipment_id: i64,
    pub code_gen: String,
    pub unit_type: String,
    pub lifecycle_status: LifecycleStatus,
    pub arrived_at: NaiveDateTime,
}

/// One shipment's position after a reorganization pass: its display order and,
/// if it was granted one, its bay number.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedShipment {
    pub snapshot: ShipmentSnapshot,
    pub display_order: i32,
    pub bay_number: Option<i32>,
}

/// The bay-state representation served on the HTTP surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BayView {
    pub bay_number: i32,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_gen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
}

impl From<&BayAssignment> for BayView {
    fn from(bay: &BayAssignment) -> Self {
        BayView {
            bay_number: bay.bay_number,
            occupied: !bay.is_free(),
            shipment_id: bay.shipment_id,
            code_gen: bay.code_gen.clone(),
            assigned_at: bay.assigned_at.map(|at| at.and_utc().to_rfc3339()),
        }
    }
}

/// The queue-position representation served after a reorganization pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePositionView {
    pub shipment_id: i64,
    pub code_gen: String,
    pub tipo_unidad: String,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bay_number: Option<i32>,
}

impl From<&OrderedShipment> for QueuePositionView {
    fn from(ordered: &OrderedShipment) -> Self {
        QueuePositionView {
            shipment_id: ordered.snapshot.shipment_id,
            code_gen: ordered.snapshot.code_gen.clone(),
            tipo_unidad: ordered.snapshot.unit_type.clone(),
            display_order: ordered.display_order,
            bay_number: ordered.bay_number,
        }
    }
}
