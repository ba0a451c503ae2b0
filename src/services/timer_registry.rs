//! # Timer Registry
//!
//! This module provides CRUD over the named operation timers the weighbridge stations run
//! against shipments. A timer is pure persisted state: starting it stores the start instant
//! (plant-local with explicit offset) and every station derives elapsed time from that row,
//! so the clock survives process restarts and reads identically everywhere.

use std::sync::Arc;

use tracing::info;

use crate::errors::{PiletasError, PiletasResult};
use crate::models::{utc_now, Timer, TimerStats};
use crate::repositories::{DisplayOrderRepository, TimerRepository};

/// Manages the active-timer table and the display-order cleanup tied to it.
pub struct TimerRegistry {
    timers: Arc<dyn TimerRepository>,
    display_orders: Arc<dyn DisplayOrderRepository>,
    /// The plant's UTC offset in minutes, stamped on every started timer
    utc_offset_minutes: i32,
}

impl TimerRegistry {
    pub fn new(
        timers: Arc<dyn TimerRepository>,
        display_orders: Arc<dyn DisplayOrderRepository>,
        utc_offset_minutes: i32,
    ) -> Self {
        Self {
            timers,
            display_orders,
            utc_offset_minutes,
        }
    }

    /// Starts (or re-arms) the timer identified by `timer_id`.
    ///
    /// Always succeeds for valid input: an existing identifier has its start
    /// instant overwritten. The timer represents "this station's clock for this
    /// shipment" and stations re-arm it on page reloads, so last-write-wins is
    /// the intended contract.
    pub async fn start_timer(
        &self,
        timer_id: &str,
        code_gen: &str,
        shipment_id: i64,
        timer_category: &str,
        unit_type: &str,
    ) -> PiletasResult<Timer> {
        if timer_id.trim().is_empty() {
            return Err(PiletasError::ValidationError(
                "timerId must not be empty".to_string(),
            ));
        }
        if code_gen.trim().is_empty() {
            return Err(PiletasError::ValidationError(
                "codeGen must not be empty".to_string(),
            ));
        }
        if shipment_id <= 0 {
            return Err(PiletasError::ValidationError(
                "shipmentId must be positive".to_string(),
            ));
        }
        if timer_category.trim().is_empty() {
            return Err(PiletasError::ValidationError(
                "tipoTimer must not be empty".to_string(),
            ));
        }

        let timer = Timer {
            timer_id: timer_id.to_string(),
            code_gen: code_gen.to_string(),
            shipment_id,
            timer_category: timer_category.to_string(),
            unit_type: unit_type.to_string(),
            started_at_utc: utc_now(),
            utc_offset_minutes: self.utc_offset_minutes,
        };
        self.timers.upsert(&timer).await?;
        info!(
            "Timer {} armed for shipment {} ({})",
            timer.timer_id, timer.shipment_id, timer.timer_category
        );
        Ok(timer)
    }

    /// Stops the timer; returns whether a row existed. A missing timer is not an error.
    pub async fn stop_timer(&self, timer_id: &str) -> PiletasResult<bool> {
        if timer_id.trim().is_empty() {
            return Err(PiletasError::ValidationError(
                "timerId must not be empty".to_string(),
            ));
        }
        let stopped = self.timers.delete(timer_id).await?;
        if stopped {
            info!("Timer {} stopped", timer_id);
        }
        Ok(stopped)
    }

    /// All active timers in a category, in no particular order; callers resort
    /// by shipment priority separately.
    pub async fn active_timers(&self, timer_category: &str) -> PiletasResult<Vec<Timer>> {
        self.timers.find_by_category(timer_category).await
    }

    /// Point lookup; `None` is a valid result.
    pub async fn get_timer(&self, timer_id: &str) -> PiletasResult<Option<Timer>> {
        self.timers.find(timer_id).await
    }

    pub async fn is_timer_active(&self, timer_id: &str) -> PiletasResult<bool> {
        Ok(self.timers.find(timer_id).await?.is_some())
    }

    /// Releases everything tracked for a shipment: its timers and its
    /// display-order rows. Safe to call redundantly from multiple trigger
    /// points; returns `false` when nothing was found.
    pub async fn release_by_shipment(&self, shipment_id: i64) -> PiletasResult<bool> {
        if shipment_id <= 0 {
            return Err(PiletasError::ValidationError(
                "shipmentId must be positive".to_string(),
            ));
        }
        let timers_removed = self.timers.delete_by_shipment(shipment_id).await?;
        let orders_removed = self.display_orders.delete_by_shipment(shipment_id).await?;
        let released = timers_removed + orders_removed > 0;
        if released {
            info!(
                "Released shipment {}: {} timer(s), {} display row(s)",
                shipment_id, timers_removed, orders_removed
            );
        }
        Ok(released)
    }

    /// Aggregate counts over the active timer table.
    pub async fn stats(&self) -> PiletasResult<TimerStats> {
        let by_category = self.timers.count_by_category().await?;
        let total_active = by_category.iter().map(|c| c.active).sum();
        Ok(TimerStats {
            total_active,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{InMemoryDisplayOrderRepository, InMemoryTimerRepository};

    fn registry() -> TimerRegistry {
        TimerRegistry::new(
            Arc::new(InMemoryTimerRepository::new()),
            Arc::new(InMemoryDisplayOrderRepository::new()),
            -180,
        )
    }

    #[tokio::test]
    async fn start_rejects_empty_identifier() {
        let registry = registry();
        let err = registry
            .start_timer("", "TRX-1", 1, "melaza-descarga", "P")
            .await
            .expect_err("empty timer id");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn start_rejects_non_positive_shipment() {
        let registry = registry();
        let err = registry
            .start_timer("t-1", "TRX-1", 0, "melaza-descarga", "P")
            .await
            .expect_err("non-positive shipment id");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn start_stamps_the_plant_offset() {
        let registry = registry();
        let timer = registry
            .start_timer("t-1", "TRX-1", 1, "melaza-descarga", "P")
            .await
            .expect("valid start");
        assert_eq!(timer.utc_offset_minutes, -180);
    }
}
