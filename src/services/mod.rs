pub mod db;
pub mod dbc;
pub mod shipping_api;
pub mod timer_registry;
pub mod bay_allocator;
pub mod temperature_gate;

pub use db::*;
pub use dbc::*;
pub use shipping_api::*;
pub use timer_registry::*;
pub use bay_allocator::*;
pub use temperature_gate::*;
