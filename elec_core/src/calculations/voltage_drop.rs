//! # Voltage Drop
//!
//! Resistive voltage drop along a circuit conductor.
//!
//! ```text
//! VD = k × I × R × L
//! k  = 2   single-phase, or 1/2-pole circuits
//! k  = √3  3-pole circuits on a three-phase system
//! ```
//!
//! ## Example
//!
//! ```rust
//! use elec_core::calculations::voltage_drop::{calculate, VoltageDropInput};
//! use elec_core::conductors::ConductorMaterial;
//! use elec_core::schedule::PhaseConfiguration;
//!
//! let input = VoltageDropInput {
//!     current_a: 16.0,
//!     length_m: 30.0,
//!     conductor_mm2: 3.5,
//!     material: ConductorMaterial::Copper,
//!     system_voltage: 230.0,
//!     phase_configuration: PhaseConfiguration::SinglePhase,
//!     poles: 1,
//!     temperature_c: 20.0,
//! };
//! let result = calculate(&input, 3.0).unwrap();
//! assert!(result.drop_percent < 3.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::{resistance_ohm_per_m, ConductorMaterial};
use crate::errors::{ElecError, ElecResult};
use crate::schedule::item::safe_div;
use crate::schedule::PhaseConfiguration;

/// Voltage drop calculation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropInput {
    pub current_a: f64,
    /// One-way length (m)
    pub length_m: f64,
    pub conductor_mm2: f64,
    #[serde(default)]
    pub material: ConductorMaterial,
    pub system_voltage: f64,
    #[serde(default)]
    pub phase_configuration: PhaseConfiguration,
    /// Breaker poles of the circuit (1–3)
    #[serde(default = "default_poles")]
    pub poles: usize,
    /// Conductor temperature (°C)
    pub temperature_c: f64,
}

fn default_poles() -> usize {
    1
}

impl VoltageDropInput {
    /// Validate input parameters.
    pub fn validate(&self) -> ElecResult<()> {
        let non_negative = [
            ("current_a", self.current_a),
            ("length_m", self.length_m),
            ("system_voltage", self.system_voltage),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ElecError::invalid_input(field, value.to_string(), "Cannot be negative"));
            }
        }
        if !self.conductor_mm2.is_finite() || self.conductor_mm2 <= 0.0 {
            return Err(ElecError::invalid_input(
                "conductor_mm2",
                self.conductor_mm2.to_string(),
                "Conductor size must be positive",
            ));
        }
        if !(1..=3).contains(&self.poles) {
            return Err(ElecError::invalid_input(
                "poles",
                self.poles.to_string(),
                "Circuits have 1, 2 or 3 poles",
            ));
        }
        Ok(())
    }
}

/// Voltage drop results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropResult {
    /// Conductor resistance at temperature (Ω/m)
    pub resistance_ohm_per_m: f64,
    /// Multiplier k in VD = k·I·R·L
    pub drop_factor: f64,
    pub drop_v: f64,
    pub drop_percent: f64,
    pub receiving_voltage: f64,
    pub limit_percent: f64,
}

impl VoltageDropResult {
    pub fn passes(&self) -> bool {
        self.drop_percent <= self.limit_percent
    }
}

/// Path multiplier for a circuit: √3 for 3-pole on three-phase, else 2.
pub fn drop_factor(phase_configuration: PhaseConfiguration, poles: usize) -> f64 {
    if phase_configuration == PhaseConfiguration::ThreePhase && poles == 3 {
        3f64.sqrt()
    } else {
        2.0
    }
}

/// Drop in volts without validation; shared with the compliance checks.
pub(crate) fn drop_volts(
    current_a: f64,
    length_m: f64,
    conductor_mm2: f64,
    material: ConductorMaterial,
    temperature_c: f64,
    factor: f64,
) -> f64 {
    factor * current_a * resistance_ohm_per_m(conductor_mm2, material, temperature_c) * length_m
}

/// Drop as a percentage of nominal voltage; 0 when the voltage is 0.
pub(crate) fn drop_percent(drop_v: f64, system_voltage: f64) -> f64 {
    safe_div(drop_v, system_voltage) * 100.0
}

/// Calculate the voltage drop of a circuit against `limit_percent`.
pub fn calculate(input: &VoltageDropInput, limit_percent: f64) -> ElecResult<VoltageDropResult> {
    input.validate()?;

    let factor = drop_factor(input.phase_configuration, input.poles);
    let drop_v = drop_volts(
        input.current_a,
        input.length_m,
        input.conductor_mm2,
        input.material,
        input.temperature_c,
        factor,
    );

    Ok(VoltageDropResult {
        resistance_ohm_per_m: resistance_ohm_per_m(input.conductor_mm2, input.material, input.temperature_c),
        drop_factor: factor,
        drop_v,
        drop_percent: drop_percent(drop_v, input.system_voltage),
        receiving_voltage: input.system_voltage - drop_v,
        limit_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch() -> VoltageDropInput {
        VoltageDropInput {
            current_a: 16.0,
            length_m: 30.0,
            conductor_mm2: 3.5,
            material: ConductorMaterial::Copper,
            system_voltage: 230.0,
            phase_configuration: PhaseConfiguration::SinglePhase,
            poles: 1,
            temperature_c: 20.0,
        }
    }

    #[test]
    fn test_single_phase_drop() {
        // 2 × 16 × 0.004926 × 30 = 4.729 V → 2.06 %
        let result = calculate(&branch(), 3.0).unwrap();
        assert!((result.drop_v - 4.729).abs() < 0.01);
        assert!((result.drop_percent - 2.056).abs() < 0.01);
        assert!((result.receiving_voltage - 225.27).abs() < 0.01);
        assert!(result.passes());
    }

    #[test]
    fn test_three_phase_uses_root_three() {
        let mut input = branch();
        input.phase_configuration = PhaseConfiguration::ThreePhase;
        input.poles = 3;
        input.system_voltage = 400.0;
        let result = calculate(&input, 3.0).unwrap();
        assert!((result.drop_factor - 1.732).abs() < 0.001);
        assert!((result.drop_v - 4.096).abs() < 0.01);
    }

    #[test]
    fn test_long_run_fails_limit() {
        let mut input = branch();
        input.length_m = 60.0;
        let result = calculate(&input, 3.0).unwrap();
        assert!(!result.passes());
    }

    #[test]
    fn test_zero_voltage_gives_zero_percent() {
        let mut input = branch();
        input.system_voltage = 0.0;
        let result = calculate(&input, 3.0).unwrap();
        assert_eq!(result.drop_percent, 0.0);
    }

    #[test]
    fn test_invalid_input() {
        let mut input = branch();
        input.conductor_mm2 = 0.0;
        assert!(calculate(&input, 3.0).is_err());

        let mut input = branch();
        input.poles = 4;
        assert!(calculate(&input, 3.0).is_err());
    }
}
