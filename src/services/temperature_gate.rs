//! # Temperature Gate
//!
//! This module decides where a shipment goes after a temperature reading: back into
//! processing when the load has cooled enough, or into a cooling bay when it is still too
//! hot. The decision itself is pure; `TemperatureService` wraps it with the two Shipping API
//! calls the stations expect (record the reading, then push the transition) and reports
//! partial success when the push fails after a recorded reading.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::config::PiletasSettings;
use crate::errors::{PiletasError, PiletasResult};
use crate::models::{LifecycleStatus, TemperatureOrigin};
use crate::services::ShippingApiClient;

/// The pure two-branch decision over a temperature reading.
#[derive(Debug, Clone)]
pub struct TemperatureGate {
    /// Readings at or below this go to processing; above it, to cooling
    threshold: f64,
    /// Plausible reading range; values outside it are rejected before any mutation
    valid_min: f64,
    valid_max: f64,
}

/// The decided transition and the operator-facing message describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub target_status: LifecycleStatus,
    pub message: String,
}

impl TemperatureGate {
    pub fn new(settings: &PiletasSettings) -> Self {
        Self {
            threshold: settings.temperature_threshold,
            valid_min: settings.temperature_min,
            valid_max: settings.temperature_max,
        }
    }

    /// Decides the next lifecycle status for a reading taken at `origin`.
    ///
    /// Both origins route the same way: at or below the threshold the shipment
    /// proceeds to (or returns to) processing; above it the shipment goes to
    /// (or stays in) cooling. Out-of-range readings are validation errors.
    pub fn decide(
        &self,
        temperature: f64,
        origin: TemperatureOrigin,
    ) -> PiletasResult<GateDecision> {
        if !temperature.is_finite() || temperature < self.valid_min || temperature > self.valid_max
        {
            return Err(PiletasError::ValidationError(format!(
                "temperatura {} fuera del rango [{}, {}]",
                temperature, self.valid_min, self.valid_max
            )));
        }

        let decision = if temperature <= self.threshold {
            GateDecision {
                target_status: LifecycleStatus::Processing,
                message: match origin {
                    TemperatureOrigin::Queue => {
                        "Temperatura en rango: pasa a descarga".to_string()
                    }
                    TemperatureOrigin::Cooling => {
                        "Temperatura en rango: vuelve a descarga".to_string()
                    }
                },
            }
        } else {
            GateDecision {
                target_status: LifecycleStatus::Cooling,
                message: match origin {
                    TemperatureOrigin::Queue => {
                        "Temperatura elevada: pasa a pileta de enfriamiento".to_string()
                    }
                    TemperatureOrigin::Cooling => {
                        "Temperatura elevada: permanece en pileta".to_string()
                    }
                },
            }
        };
        Ok(decision)
    }
}

/// What actually happened when a reading was processed. The reading and the
/// transition are two separate upstream writes; a failed push after a recorded
/// reading is reported as-is, never rolled back and never collapsed into a
/// single boolean.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureOutcome {
    pub code_gen: String,
    pub temperatura: f64,
    pub target_status: i32,
    pub message: String,
    pub reading_recorded: bool,
    pub transition_pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_error: Option<String>,
}

/// Records readings and routes shipments through the Shipping API.
pub struct TemperatureService {
    gate: TemperatureGate,
    shipping: Arc<ShippingApiClient>,
}

impl TemperatureService {
    pub fn new(gate: TemperatureGate, shipping: Arc<ShippingApiClient>) -> Self {
        Self { gate, shipping }
    }

    /// Validates, records the reading, then pushes the decided transition.
    ///
    /// Validation happens before any upstream write. A failure recording the
    /// reading aborts the whole call; a failure pushing the transition after a
    /// recorded reading yields a partial-success outcome.
    pub async fn record_and_route(
        &self,
        code_gen: &str,
        temperature: f64,
        origin: TemperatureOrigin,
    ) -> PiletasResult<TemperatureOutcome> {
        if code_gen.trim().is_empty() {
            return Err(PiletasError::ValidationError(
                "codeGen must not be empty".to_string(),
            ));
        }
        let decision = self.gate.decide(temperature, origin)?;

        self.shipping.record_temperature(code_gen, temperature).await?;
        info!(
            "Temperature {} recorded for {} (origin {})",
            temperature, code_gen, origin
        );

        match self
            .shipping
            .push_status(code_gen, decision.target_status)
            .await
        {
            Ok(()) => Ok(TemperatureOutcome {
                code_gen: code_gen.to_string(),
                temperatura: temperature,
                target_status: decision.target_status.code(),
                message: decision.message,
                reading_recorded: true,
                transition_pushed: true,
                push_error: None,
            }),
            Err(e) => {
                error!(
                    "Temperature recorded for {} but status push failed: {}",
                    code_gen, e
                );
                Ok(TemperatureOutcome {
                    code_gen: code_gen.to_string(),
                    temperatura: temperature,
                    target_status: decision.target_status.code(),
                    message: decision.message,
                    reading_recorded: true,
                    transition_pushed: false,
                    push_error: Some(e.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> TemperatureGate {
        TemperatureGate {
            threshold: 41.0,
            valid_min: 0.0,
            valid_max: 50.0,
        }
    }

    #[test]
    fn at_threshold_from_queue_goes_to_processing() {
        let decision = gate()
            .decide(41.0, TemperatureOrigin::Queue)
            .expect("valid reading");
        assert_eq!(decision.target_status, LifecycleStatus::Processing);
    }

    #[test]
    fn just_above_threshold_from_queue_goes_to_cooling() {
        let decision = gate()
            .decide(41.01, TemperatureOrigin::Queue)
            .expect("valid reading");
        assert_eq!(decision.target_status, LifecycleStatus::Cooling);
    }

    #[test]
    fn cool_reading_returns_a_cooling_shipment_to_processing() {
        let decision = gate()
            .decide(20.0, TemperatureOrigin::Cooling)
            .expect("valid reading");
        assert_eq!(decision.target_status, LifecycleStatus::Processing);
    }

    #[test]
    fn hot_reading_keeps_a_cooling_shipment_in_cooling() {
        let decision = gate()
            .decide(50.0, TemperatureOrigin::Cooling)
            .expect("valid reading");
        assert_eq!(decision.target_status, LifecycleStatus::Cooling);
    }

    #[test]
    fn out_of_range_readings_are_rejected() {
        assert!(gate().decide(-0.5, TemperatureOrigin::Queue).is_err());
        assert!(gate().decide(50.5, TemperatureOrigin::Queue).is_err());
        assert!(gate().decide(f64::NAN, TemperatureOrigin::Queue).is_err());
    }
}
