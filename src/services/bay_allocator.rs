//! # Bay Allocator
//!
//! This module assigns the bounded pool of physical cooling bays to the shipments currently
//! in the queue and processing states. The central correctness rule is stability over
//! optimality: a truck physically sitting in a bay is never moved to a different bay while it
//! is still active. Free bays are granted FIFO by arrival time, and the whole candidate set is
//! renumbered 1..n for display on every pass.
//!
//! Planning is a pure function over the current bay table and the candidate snapshots; the
//! surrounding service serializes the read-modify-write under a process-wide mutex and
//! persists the outcome through the repositories.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::PiletasResult;
use crate::models::{
    BayAssignment, DisplayOrderEntry, OrderedShipment, ShipmentSnapshot,
};
use crate::repositories::{BayRepository, DisplayOrderRepository};
use crate::services::ShippingApiClient;

/// The outcome of one planning pass: which bays to clear, which grants to make,
/// and the display ordering of the whole candidate set.
#[derive(Debug, Clone, Default)]
pub struct AllocationPlan {
    /// Bay numbers whose occupant left the candidate set
    pub releases: Vec<i32>,
    /// Grants of free bays to not-yet-assigned shipments, FIFO by arrival
    pub grants: Vec<(i32, ShipmentSnapshot)>,
    /// Every candidate with its display order and, if assigned, its bay number
    pub ordering: Vec<OrderedShipment>,
}

/// Computes the continuity-preserving assignment for one candidate set.
///
/// * Bays held by shipments no longer present are released.
/// * Shipments already holding a bay keep exactly that bay.
/// * Remaining free bays (ascending by bay number) go to unassigned shipments
///   in ascending (arrival, shipment id) order.
/// * Display orders number bay holders by bay number first, then the waiting
///   group by arrival, contiguously from 1.
pub fn plan(bays: &[BayAssignment], candidates: &[ShipmentSnapshot]) -> AllocationPlan {
    let candidate_ids: HashSet<i64> = candidates.iter().map(|c| c.shipment_id).collect();

    let releases: Vec<i32> = bays
        .iter()
        .filter(|b| b.shipment_id.map_or(false, |id| !candidate_ids.contains(&id)))
        .map(|b| b.bay_number)
        .collect();

    let held: Vec<(i32, i64)> = bays
        .iter()
        .filter_map(|b| {
            b.shipment_id
                .filter(|id| candidate_ids.contains(id))
                .map(|id| (b.bay_number, id))
        })
        .collect();
    let held_ids: HashSet<i64> = held.iter().map(|(_, id)| *id).collect();

    let mut free: Vec<i32> = bays
        .iter()
        .filter(|b| b.is_free() || releases.contains(&b.bay_number))
        .map(|b| b.bay_number)
        .collect();
    free.sort_unstable();

    let mut newcomers: Vec<&ShipmentSnapshot> = candidates
        .iter()
        .filter(|c| !held_ids.contains(&c.shipment_id))
        .collect();
    newcomers.sort_by(|a, b| {
        a.arrived_at
            .cmp(&b.arrived_at)
            .then(a.shipment_id.cmp(&b.shipment_id))
    });

    let grants: Vec<(i32, ShipmentSnapshot)> = free
        .iter()
        .zip(newcomers.iter())
        .map(|(bay_number, snapshot)| (*bay_number, (*snapshot).clone()))
        .collect();

    let waiting: Vec<ShipmentSnapshot> = newcomers
        .iter()
        .skip(grants.len())
        .map(|snapshot| (*snapshot).clone())
        .collect();

    let mut with_bay: Vec<(i32, ShipmentSnapshot)> = held
        .iter()
        .filter_map(|(bay_number, shipment_id)| {
            candidates
                .iter()
                .find(|c| c.shipment_id == *shipment_id)
                .map(|snapshot| (*bay_number, snapshot.clone()))
        })
        .collect();
    with_bay.extend(grants.iter().cloned());
    with_bay.sort_by_key(|(bay_number, _)| *bay_number);

    let mut ordering = Vec::with_capacity(candidates.len());
    let mut next_order = 1;
    for (bay_number, snapshot) in with_bay {
        ordering.push(OrderedShipment {
            snapshot,
            display_order: next_order,
            bay_number: Some(bay_number),
        });
        next_order += 1;
    }
    for snapshot in waiting {
        ordering.push(OrderedShipment {
            snapshot,
            display_order: next_order,
            bay_number: None,
        });
        next_order += 1;
    }

    AllocationPlan {
        releases,
        grants,
        ordering,
    }
}

/// Owns the reorganization pass: candidate intake, planning, and persistence.
pub struct BayAllocator {
    bays: Arc<dyn BayRepository>,
    display_orders: Arc<dyn DisplayOrderRepository>,
    shipping: Arc<ShippingApiClient>,
    /// Single-writer discipline over the bay read-modify-write
    reorganize_guard: Mutex<()>,
}

impl BayAllocator {
    pub fn new(
        bays: Arc<dyn BayRepository>,
        display_orders: Arc<dyn DisplayOrderRepository>,
        shipping: Arc<ShippingApiClient>,
    ) -> Self {
        Self {
            bays,
            display_orders,
            shipping,
            reorganize_guard: Mutex::new(()),
        }
    }

    /// Reorganizes bays and display ordering for the given candidate set.
    ///
    /// The whole pass runs under the process-wide reorganize guard so two
    /// stations polling at once cannot interleave their read-modify-write.
    /// Each grant additionally goes through the repository's conditional
    /// free-bay update, which fails with `BayConflict` rather than letting a
    /// bay be double-assigned.
    pub async fn reorganize(
        &self,
        timer_category: &str,
        candidates: &[ShipmentSnapshot],
    ) -> PiletasResult<Vec<OrderedShipment>> {
        let _guard = self.reorganize_guard.lock().await;

        let mut unique: Vec<ShipmentSnapshot> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if unique
                .iter()
                .any(|c| c.shipment_id == candidate.shipment_id)
            {
                warn!(
                    "Duplicate candidate shipment {} ignored during reorganization",
                    candidate.shipment_id
                );
                continue;
            }
            unique.push(candidate.clone());
        }

        let bays = self.bays.fetch_all().await?;
        let plan = plan(&bays, &unique);

        for bay_number in &plan.releases {
            self.bays.release(*bay_number).await?;
            info!("Bay {} released", bay_number);
        }

        for (bay_number, snapshot) in &plan.grants {
            self.bays.assign(*bay_number, snapshot).await?;
            info!(
                "Bay {} granted to shipment {} ({})",
                bay_number, snapshot.shipment_id, snapshot.code_gen
            );
        }

        for ordered in &plan.ordering {
            self.display_orders
                .upsert(&DisplayOrderEntry {
                    shipment_id: ordered.snapshot.shipment_id,
                    code_gen: ordered.snapshot.code_gen.clone(),
                    timer_category: timer_category.to_string(),
                    display_order: ordered.display_order,
                    lifecycle_status: ordered.snapshot.lifecycle_status.code(),
                })
                .await?;
        }

        let keep: Vec<i64> = unique.iter().map(|c| c.shipment_id).collect();
        let removed = self
            .display_orders
            .retain_shipments(timer_category, &keep)
            .await?;
        if removed > 0 {
            info!("Cleared {} stale display row(s)", removed);
        }

        Ok(plan.ordering)
    }

    /// Pulls the queue and processing listings from the Shipping API and
    /// reorganizes from them. This is the pass the stations trigger on their
    /// polling interval.
    pub async fn reorganize_from_api(
        &self,
        timer_category: &str,
    ) -> PiletasResult<Vec<OrderedShipment>> {
        let candidates = self.shipping.fetch_tracked_snapshots().await?;
        info!(
            "Reorganizing {} tracked shipment(s) from the Shipping API",
            candidates.len()
        );
        self.reorganize(timer_category, &candidates).await
    }

    /// The current bay table. Reads are served without the reorganize guard;
    /// staleness of a polling interval is acceptable here.
    pub async fn current_bays(&self) -> PiletasResult<Vec<BayAssignment>> {
        self.bays.fetch_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{utc_now, LifecycleStatus};
    use chrono::NaiveDate;

    fn snapshot(shipment_id: i64, minute: u32) -> ShipmentSnapshot {
        ShipmentSnapshot {
            shipment_id,
            code_gen: format!("TRX-{:04}", shipment_id),
            unit_type: "P".to_string(),
            lifecycle_status: LifecycleStatus::Queued,
            arrived_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(8, minute, 0)
                .unwrap(),
        }
    }

    fn free_bays(count: i32) -> Vec<BayAssignment> {
        (1..=count)
            .map(|n| BayAssignment::free(n, utc_now()))
            .collect()
    }

    fn occupy(bays: &mut [BayAssignment], bay_number: i32, shipment_id: i64) {
        let bay = bays
            .iter_mut()
            .find(|b| b.bay_number == bay_number)
            .expect("bay exists");
        bay.shipment_id = Some(shipment_id);
        bay.code_gen = Some(format!("TRX-{:04}", shipment_id));
        bay.assigned_at = Some(utc_now());
        bay.shipment_snapshot = Some("{}".to_string());
    }

    #[test]
    fn fifo_grants_and_contiguous_ordering() {
        let bays = free_bays(5);
        // arrival order is the reverse of id order to prove FIFO wins
        let candidates: Vec<ShipmentSnapshot> =
            (1..=7).map(|id| snapshot(id, 60 - id as u32)).collect();

        let plan = plan(&bays, &candidates);

        assert_eq!(plan.grants.len(), 5);
        // earliest arrivals are ids 7,6,5,4,3
        let granted: Vec<i64> = plan.grants.iter().map(|(_, s)| s.shipment_id).collect();
        assert_eq!(granted, vec![7, 6, 5, 4, 3]);

        let orders: Vec<i32> = plan.ordering.iter().map(|o| o.display_order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
        // the two latest arrivals wait without a bay
        assert!(plan.ordering[5].bay_number.is_none());
        assert!(plan.ordering[6].bay_number.is_none());
    }

    #[test]
    fn holders_never_move() {
        let mut bays = free_bays(5);
        occupy(&mut bays, 2, 10);
        occupy(&mut bays, 4, 11);

        let candidates = vec![snapshot(10, 30), snapshot(11, 31), snapshot(12, 0)];
        let plan = plan(&bays, &candidates);

        assert!(plan.releases.is_empty());
        // the newcomer takes the lowest free bay, holders stay put
        assert_eq!(plan.grants, vec![(1, snapshot(12, 0))]);
        let by_id: Vec<(i64, Option<i32>)> = plan
            .ordering
            .iter()
            .map(|o| (o.snapshot.shipment_id, o.bay_number))
            .collect();
        assert_eq!(by_id, vec![(12, Some(1)), (10, Some(2)), (11, Some(4))]);
    }

    #[test]
    fn departed_holder_frees_its_bay_for_the_oldest_waiter() {
        let mut bays = free_bays(5);
        for (bay_number, shipment_id) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)] {
            occupy(&mut bays, bay_number, shipment_id);
        }

        // shipment 3 advanced out of queue/processing; 6 and 7 are waiting
        let candidates = vec![
            snapshot(1, 1),
            snapshot(2, 2),
            snapshot(4, 4),
            snapshot(5, 5),
            snapshot(6, 6),
            snapshot(7, 7),
        ];
        let plan = plan(&bays, &candidates);

        assert_eq!(plan.releases, vec![3]);
        assert_eq!(plan.grants.len(), 1);
        assert_eq!(plan.grants[0].0, 3);
        assert_eq!(plan.grants[0].1.shipment_id, 6);

        // the other four holders kept their bays
        for ordered in &plan.ordering {
            match ordered.snapshot.shipment_id {
                1 => assert_eq!(ordered.bay_number, Some(1)),
                2 => assert_eq!(ordered.bay_number, Some(2)),
                4 => assert_eq!(ordered.bay_number, Some(4)),
                5 => assert_eq!(ordered.bay_number, Some(5)),
                6 => assert_eq!(ordered.bay_number, Some(3)),
                7 => assert_eq!(ordered.bay_number, None),
                other => panic!("unexpected shipment {}", other),
            }
        }
    }

    #[test]
    fn empty_candidate_set_releases_everything() {
        let mut bays = free_bays(5);
        occupy(&mut bays, 1, 1);
        occupy(&mut bays, 5, 2);

        let plan = plan(&bays, &[]);
        assert_eq!(plan.releases, vec![1, 5]);
        assert!(plan.grants.is_empty());
        assert!(plan.ordering.is_empty());
    }

    #[test]
    fn fewer_candidates_than_bays_means_nobody_waits() {
        let bays = free_bays(5);
        let candidates = vec![snapshot(1, 1), snapshot(2, 2)];
        let plan = plan(&bays, &candidates);
        assert_eq!(plan.grants.len(), 2);
        assert!(plan.ordering.iter().all(|o| o.bay_number.is_some()));
    }

    #[test]
    fn arrival_ties_break_by_shipment_id() {
        let bays = free_bays(1);
        let candidates = vec![snapshot(9, 5), snapshot(4, 5), snapshot(7, 5)];
        let plan = plan(&bays, &candidates);
        assert_eq!(plan.grants.len(), 1);
        assert_eq!(plan.grants[0].1.shipment_id, 4);
        // and the ordering is deterministic across calls
        let ids: Vec<i64> = plan
            .ordering
            .iter()
            .map(|o| o.snapshot.shipment_id)
            .collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn occupancy_never_exceeds_the_bay_count() {
        let mut bays = free_bays(3);
        occupy(&mut bays, 2, 50);
        let candidates: Vec<ShipmentSnapshot> = (1..=10).map(|id| snapshot(id, id as u32)).collect();
        // holder 50 is absent, so its bay is released then regranted
        let plan = plan(&bays, &candidates);
        assert_eq!(plan.releases, vec![2]);
        assert_eq!(plan.grants.len(), 3);
        let assigned = plan
            .ordering
            .iter()
            .filter(|o| o.bay_number.is_some())
            .count();
        assert_eq!(assigned, 3);
    }
}
