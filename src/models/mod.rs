pub mod timer;
pub mod display_order;
pub mod bay;
pub mod status;
pub mod shipping;

pub use timer::*;
pub use display_order::*;
pub use bay::*;
pub use status::*;
pub use shipping::*;

use chrono::{NaiveDateTime, Utc};

pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
