//! Display ordering of shipments within a timer category's queue.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx_oldapi::FromRow;

/// A persisted display-order row. Orders are unique and contiguous (1..n)
/// within a timer category and are reassigned wholesale on every
/// reorganization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DisplayOrderRow {
    #[sqlx(rename = "ID")]
    pub id: i64,
    #[sqlx(rename = "SHIPMENT_ID")]
    pub shipment_id: i64,
    #[sqlx(rename = "CODE_GEN")]
    pub code_gen: String,
    #[sqlx(rename = "TIMER_CATEGORY")]
    pub timer_category: String,
    #[sqlx(rename = "DISPLAY_ORDER")]
    pub display_order: i32,
    #[sqlx(rename = "LIFECYCLE_STATUS")]
    pub lifecycle_status: i32,
    #[sqlx(rename = "CREATED_AT")]
    pub created_at: NaiveDateTime,
    #[sqlx(rename = "UPDATED_AT")]
    pub updated_at: NaiveDateTime,
}

/// The caller-provided portion of a display-order upsert; row id and
/// timestamps are owned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOrderEntry {
    pub shipment_id: i64,
    pub code_gen: String,
    pub timer_category: String,
    pub display_order: i32,
    pub lifecycle_status: i32,
}
