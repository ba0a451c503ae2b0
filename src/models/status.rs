//! Lifecycle status codes owned by the external Shipping API.
//!
//! The core never owns the shipment state machine; it only reads these codes
//! and requests transitions between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The subset of Shipping API lifecycle codes the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    /// 3 - registered, not yet called into the plant
    Pending,
    /// 7 - called in, waiting in the reception queue
    Queued,
    /// 8 - actively discharging on the weighbridge circuit
    Processing,
    /// 15 - parked in a cooling bay until temperature drops
    Cooling,
}

impl LifecycleStatus {
    /// The integer code used on the Shipping API wire.
    pub fn code(&self) -> i32 {
        match self {
            LifecycleStatus::Pending => 3,
            LifecycleStatus::Queued => 7,
            LifecycleStatus::Processing => 8,
            LifecycleStatus::Cooling => 15,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            3 => Some(LifecycleStatus::Pending),
            7 => Some(LifecycleStatus::Queued),
            8 => Some(LifecycleStatus::Processing),
            15 => Some(LifecycleStatus::Cooling),
            _ => None,
        }
    }

    /// Whether a shipment in this status competes for a cooling bay.
    pub fn is_tracked(&self) -> bool {
        matches!(self, LifecycleStatus::Queued | LifecycleStatus::Processing)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where a temperature reading was taken: at the reception queue or inside a cooling bay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureOrigin {
    Queue,
    Cooling,
}

impl TemperatureOrigin {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queue" => Some(TemperatureOrigin::Queue),
            "cooling" => Some(TemperatureOrigin::Cooling),
            _ => None,
        }
    }
}

impl fmt::Display for TemperatureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureOrigin::Queue => write!(f, "queue"),
            TemperatureOrigin::Cooling => write!(f, "cooling"),
        }
    }
}
