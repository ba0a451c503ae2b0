//! In-memory repository implementations.
//!
//! These implementations keep all rows in process memory behind `parking_lot`
//! locks. They are suitable for tests and single-process deployments; rows are
//! lost on restart. The semantics mirror the MSSQL implementations, including
//! the conditional free-bay grant.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::{PiletasError, PiletasResult};
use crate::models::{
    utc_now, BayAssignment, CategoryCount, DisplayOrderEntry, DisplayOrderRow, ShipmentSnapshot,
    Timer,
};
use crate::repositories::{BayRepository, DisplayOrderRepository, TimerRepository};

/// In-memory implementation of the timer table.
#[derive(Clone, Default)]
pub struct InMemoryTimerRepository {
    timers: Arc<RwLock<HashMap<String, Timer>>>,
}

impl InMemoryTimerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimerRepository for InMemoryTimerRepository {
    async fn upsert(&self, timer: &Timer) -> PiletasResult<()> {
        self.timers
            .write()
            .insert(timer.timer_id.clone(), timer.clone());
        Ok(())
    }

    async fn delete(&self, timer_id: &str) -> PiletasResult<bool> {
        Ok(self.timers.write().remove(timer_id).is_some())
    }

    async fn find(&self, timer_id: &str) -> PiletasResult<Option<Timer>> {
        Ok(self.timers.read().get(timer_id).cloned())
    }

    async fn find_by_category(&self, timer_category: &str) -> PiletasResult<Vec<Timer>> {
        Ok(self
            .timers
            .read()
            .values()
            .filter(|t| t.timer_category == timer_category)
            .cloned()
            .collect())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64> {
        let mut timers = self.timers.write();
        let before = timers.len();
        timers.retain(|_, t| t.shipment_id != shipment_id);
        Ok((before - timers.len()) as u64)
    }

    async fn count_by_category(&self) -> PiletasResult<Vec<CategoryCount>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for timer in self.timers.read().values() {
            *counts.entry(timer.timer_category.clone()).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(timer_category, active)| CategoryCount {
                timer_category,
                active,
            })
            .collect())
    }
}

/// In-memory implementation of the display-order table.
#[derive(Clone, Default)]
pub struct InMemoryDisplayOrderRepository {
    rows: Arc<RwLock<Vec<DisplayOrderRow>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryDisplayOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisplayOrderRepository for InMemoryDisplayOrderRepository {
    async fn upsert(&self, entry: &DisplayOrderEntry) -> PiletasResult<()> {
        let now = utc_now();
        let mut rows = self.rows.write();
        if let Some(existing) = rows.iter_mut().find(|r| {
            r.shipment_id == entry.shipment_id && r.timer_category == entry.timer_category
        }) {
            existing.code_gen = entry.code_gen.clone();
            existing.display_order = entry.display_order;
            existing.lifecycle_status = entry.lifecycle_status;
            existing.updated_at = now;
            return Ok(());
        }

        let mut next_id = self.next_id.write();
        *next_id += 1;
        rows.push(DisplayOrderRow {
            id: *next_id,
            shipment_id: entry.shipment_id,
            code_gen: entry.code_gen.clone(),
            timer_category: entry.timer_category.clone(),
            display_order: entry.display_order,
            lifecycle_status: entry.lifecycle_status,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| r.shipment_id != shipment_id);
        Ok((before - rows.len()) as u64)
    }

    async fn retain_shipments(
        &self,
        timer_category: &str,
        shipment_ids: &[i64],
    ) -> PiletasResult<u64> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| {
            r.timer_category != timer_category || shipment_ids.contains(&r.shipment_id)
        });
        Ok((before - rows.len()) as u64)
    }

    async fn fetch_by_category(&self, timer_category: &str) -> PiletasResult<Vec<DisplayOrderRow>> {
        let mut rows: Vec<DisplayOrderRow> = self
            .rows
            .read()
            .iter()
            .filter(|r| r.timer_category == timer_category)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.display_order);
        Ok(rows)
    }
}

/// In-memory implementation of the fixed cooling-bay table.
#[derive(Clone, Default)]
pub struct InMemoryBayRepository {
    bays: Arc<RwLock<BTreeMap<i32, BayAssignment>>>,
}

impl InMemoryBayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor provisioning `1..=bay_count` free bays.
    pub fn with_bay_count(bay_count: i32) -> Self {
        let repo = Self::new();
        let now = utc_now();
        let mut bays = repo.bays.write();
        for bay_number in 1..=bay_count {
            bays.insert(bay_number, BayAssignment::free(bay_number, now));
        }
        drop(bays);
        repo
    }
}

#[async_trait]
impl BayRepository for InMemoryBayRepository {
    async fn fetch_all(&self) -> PiletasResult<Vec<BayAssignment>> {
        Ok(self.bays.read().values().cloned().collect())
    }

    async fn ensure_bays(&self, bay_numbers: &[i32]) -> PiletasResult<()> {
        let now = utc_now();
        let mut bays = self.bays.write();
        for bay_number in bay_numbers {
            bays.entry(*bay_number)
                .or_insert_with(|| BayAssignment::free(*bay_number, now));
        }
        Ok(())
    }

    async fn release(&self, bay_number: i32) -> PiletasResult<()> {
        let now = utc_now();
        if let Some(bay) = self.bays.write().get_mut(&bay_number) {
            *bay = BayAssignment::free(bay_number, now);
        }
        Ok(())
    }

    async fn assign(&self, bay_number: i32, snapshot: &ShipmentSnapshot) -> PiletasResult<()> {
        let now = utc_now();
        let mut bays = self.bays.write();
        let bay = bays.get_mut(&bay_number).ok_or_else(|| {
            PiletasError::BayConflict(format!("bay {} does not exist", bay_number))
        })?;
        if !bay.is_free() {
            return Err(PiletasError::BayConflict(format!(
                "bay {} is no longer free; shipment {} was not assigned",
                bay_number, snapshot.shipment_id
            )));
        }
        bay.shipment_id = Some(snapshot.shipment_id);
        bay.code_gen = Some(snapshot.code_gen.clone());
        bay.assigned_at = Some(now);
        bay.shipment_snapshot = Some(serde_json::to_string(snapshot)?);
        bay.updated_at = now;
        Ok(())
    }
}
