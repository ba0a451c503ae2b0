//! # Operation Timers
//!
//! This module defines the persisted shape of one running stopwatch tied to one shipment,
//! together with the wire representation served to the weighbridge stations.
//! A timer is pure state: only the start instant is stored, and every reader derives
//! elapsed time from it, so all stations see identical clocks across restarts.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx_oldapi::FromRow;

/// Represents one active timer row, keyed by a client-supplied timer identifier.
///
/// Starting a timer that already exists overwrites the start instant. That
/// last-write-wins behavior is intentional: the identifier means "this station's
/// clock for this shipment", and stations re-arm it on page reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Timer {
    /// The client-chosen timer identifier
    #[sqlx(rename = "TIMER_ID")]
    pub timer_id: String,
    /// The external, human-scannable shipment transaction code
    #[sqlx(rename = "CODE_GEN")]
    pub code_gen: String,
    /// The numeric shipment id in the Shipping API
    #[sqlx(rename = "SHIPMENT_ID")]
    pub shipment_id: i64,
    /// What the stopwatch measures (e.g. "melaza-descarga")
    #[sqlx(rename = "TIMER_CATEGORY")]
    pub timer_category: String,
    /// The truck category the shipment arrived with
    #[sqlx(rename = "UNIT_TYPE")]
    pub unit_type: String,
    /// The start instant, stored in UTC
    #[sqlx(rename = "STARTED_AT_UTC")]
    pub started_at_utc: NaiveDateTime,
    /// The plant's UTC offset in minutes at the time the timer was armed
    #[sqlx(rename = "UTC_OFFSET_MINUTES")]
    pub utc_offset_minutes: i32,
}

impl Timer {
    /// The start instant in plant-local time, with its explicit offset.
    pub fn started_at_local(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is always valid"));
        offset.from_utc_datetime(&self.started_at_utc)
    }

    /// The start instant as milliseconds since the Unix epoch.
    pub fn started_at_milliseconds(&self) -> i64 {
        Utc.from_utc_datetime(&self.started_at_utc).timestamp_millis()
    }
}

/// The timer representation served on the HTTP surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub timer_id: String,
    pub code_gen: String,
    pub shipment_id: i64,
    pub tipo_timer: String,
    pub tipo_unidad: String,
    pub started_at_local: String,
    pub started_at_utc: String,
    pub started_at_milliseconds: i64,
    pub is_running: bool,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        TimerView {
            timer_id: timer.timer_id.clone(),
            code_gen: timer.code_gen.clone(),
            shipment_id: timer.shipment_id,
            tipo_timer: timer.timer_category.clone(),
            tipo_unidad: timer.unit_type.clone(),
            started_at_local: timer.started_at_local().to_rfc3339(),
            started_at_utc: Utc.from_utc_datetime(&timer.started_at_utc).to_rfc3339(),
            started_at_milliseconds: timer.started_at_milliseconds(),
            is_running: true,
        }
    }
}

/// Aggregate counts over the active timer table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStats {
    pub total_active: i64,
    pub by_category: Vec<CategoryCount>,
}

/// Number of active timers for one timer category.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    #[sqlx(rename = "TIMER_CATEGORY")]
    pub timer_category: String,
    #[sqlx(rename = "ACTIVE")]
    pub active: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timer_at(utc: NaiveDateTime, offset_minutes: i32) -> Timer {
        Timer {
            timer_id: "estacion-1-melaza".to_string(),
            code_gen: "TRX-0001".to_string(),
            shipment_id: 42,
            timer_category: "melaza-descarga".to_string(),
            unit_type: "P".to_string(),
            started_at_utc: utc,
            utc_offset_minutes: offset_minutes,
        }
    }

    #[test]
    fn local_instant_carries_the_plant_offset() {
        let utc = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let timer = timer_at(utc, -180);
        let local = timer.started_at_local();
        assert_eq!(local.offset().local_minus_utc(), -180 * 60);
        assert_eq!(local.naive_utc(), utc);
    }

    #[test]
    fn view_reports_epoch_milliseconds() {
        let utc = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let timer = timer_at(utc, -180);
        let view = TimerView::from(&timer);
        assert_eq!(view.started_at_milliseconds, 1717200000000);
        assert!(view.is_running);
        assert_eq!(view.tipo_timer, "melaza-descarga");
    }
}
