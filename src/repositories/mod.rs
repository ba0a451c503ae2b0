pub mod timer_repository;
pub mod display_order_repository;
pub mod bay_repository;
pub mod in_memory;

pub use timer_repository::*;
pub use display_order_repository::*;
pub use bay_repository::*;
pub use in_memory::*;

use async_trait::async_trait;

use crate::errors::PiletasResult;
use crate::models::{
    BayAssignment, CategoryCount, DisplayOrderEntry, DisplayOrderRow, ShipmentSnapshot, Timer,
};

/// Store of active timers, keyed by the client-supplied timer identifier.
///
/// All mutation of the timer table goes through this trait; no other component
/// may write those rows directly.
#[async_trait]
pub trait TimerRepository: Send + Sync {
    /// Creates the row, or overwrites the start instant if the identifier already exists.
    async fn upsert(&self, timer: &Timer) -> PiletasResult<()>;

    /// Deletes the row if present; returns whether a row existed.
    async fn delete(&self, timer_id: &str) -> PiletasResult<bool>;

    /// Point lookup; `None` is a valid, non-error result.
    async fn find(&self, timer_id: &str) -> PiletasResult<Option<Timer>>;

    /// All rows whose category matches, in no particular order.
    async fn find_by_category(&self, timer_category: &str) -> PiletasResult<Vec<Timer>>;

    /// Deletes every timer tied to the shipment; returns how many rows went away.
    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64>;

    /// Active-timer counts grouped by category.
    async fn count_by_category(&self) -> PiletasResult<Vec<CategoryCount>>;
}

/// Store of display-order rows, partitioned by timer category.
#[async_trait]
pub trait DisplayOrderRepository: Send + Sync {
    /// Creates or updates the shipment's row within its timer category.
    async fn upsert(&self, entry: &DisplayOrderEntry) -> PiletasResult<()>;

    /// Deletes any rows for the shipment; returns how many rows went away.
    async fn delete_by_shipment(&self, shipment_id: i64) -> PiletasResult<u64>;

    /// Deletes rows in the category whose shipment is not in `shipment_ids`;
    /// returns how many rows went away.
    async fn retain_shipments(
        &self,
        timer_category: &str,
        shipment_ids: &[i64],
    ) -> PiletasResult<u64>;

    /// All rows in the category, ascending by display order.
    async fn fetch_by_category(&self, timer_category: &str) -> PiletasResult<Vec<DisplayOrderRow>>;
}

/// Store of the fixed cooling-bay table.
#[async_trait]
pub trait BayRepository: Send + Sync {
    /// All bay rows, ascending by bay number.
    async fn fetch_all(&self) -> PiletasResult<Vec<BayAssignment>>;

    /// Provisions missing bay rows as free; existing rows are left untouched.
    async fn ensure_bays(&self, bay_numbers: &[i32]) -> PiletasResult<()>;

    /// Clears a bay's assignment fields, leaving the bay row in place.
    async fn release(&self, bay_number: i32) -> PiletasResult<()>;

    /// Grants a free bay to the shipment. Fails with `BayConflict` when the bay
    /// is already occupied, so two racing callers can never double-assign it.
    async fn assign(&self, bay_number: i32, snapshot: &ShipmentSnapshot) -> PiletasResult<()>;
}
