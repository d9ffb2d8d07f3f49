//! # Electrical Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` / borrowed schedule - input (JSON-serializable)
//! - `*Result` - calculation results (JSON-serializable)
//! - a pure function returning `ElecResult<*Result>`
//!
//! ## Available Calculations
//!
//! - [`voltage_drop`] - Conductor voltage drop
//! - [`phase_balance`] - Three-phase load distribution
//! - [`compliance`] - PEC 2017 checks over a whole schedule
//! - [`economic_sizing`] - Lifecycle-cost comparison of conductor sizes

pub mod compliance;
pub mod economic_sizing;
pub mod phase_balance;
pub mod voltage_drop;

use serde::{Deserialize, Serialize};

pub use compliance::{evaluate_compliance, ComplianceResult, ItemCompliance};
pub use economic_sizing::{compare_conductor_sizes, ConductorComparison, ConductorOption};
pub use phase_balance::{compute_phase_balance, PhaseBalanceResult};
pub use voltage_drop::{VoltageDropInput, VoltageDropResult};

use crate::conductors::ConductorMaterial;
use crate::errors::{ElecError, ElecResult};
use crate::standards::MAX_AMBIENT_TEMPERATURE_C;

/// Site and economic parameters shared by the analyses.
///
/// ## JSON Example
///
/// ```json
/// {
///   "conductor_length_m": 30.0,
///   "material": "copper",
///   "temperature_c": 75.0,
///   "ambient_temperature_c": 30.0,
///   "electricity_rate_per_kwh": 11.0,
///   "operating_hours_per_year": 3000.0,
///   "lifecycle_years": 20,
///   "discount_rate_percent": 0.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisParameters {
    /// Branch length used when an item has no circuit length (m)
    pub conductor_length_m: f64,
    pub material: ConductorMaterial,
    /// Conductor operating temperature for resistance (°C)
    pub temperature_c: f64,
    /// Ambient temperature for ampacity correction (°C)
    pub ambient_temperature_c: f64,
    /// Energy price (PHP/kWh)
    pub electricity_rate_per_kwh: f64,
    pub operating_hours_per_year: f64,
    pub lifecycle_years: u32,
    /// Annual discount rate for present-worth of losses (%); 0 disables
    pub discount_rate_percent: f64,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        AnalysisParameters {
            conductor_length_m: 30.0,
            material: ConductorMaterial::Copper,
            temperature_c: 75.0,
            ambient_temperature_c: 30.0,
            electricity_rate_per_kwh: 11.0,
            operating_hours_per_year: 3000.0,
            lifecycle_years: 20,
            discount_rate_percent: 0.0,
        }
    }
}

impl AnalysisParameters {
    /// Validate input parameters.
    pub fn validate(&self) -> ElecResult<()> {
        let non_negative = [
            ("conductor_length_m", self.conductor_length_m),
            ("electricity_rate_per_kwh", self.electricity_rate_per_kwh),
            ("discount_rate_percent", self.discount_rate_percent),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ElecError::invalid_input(field, value.to_string(), "Cannot be negative"));
            }
        }
        if !(0.0..=8760.0).contains(&self.operating_hours_per_year) {
            return Err(ElecError::invalid_input(
                "operating_hours_per_year",
                self.operating_hours_per_year.to_string(),
                "Must be between 0 and 8760 hours",
            ));
        }
        if !self.temperature_c.is_finite() || !self.ambient_temperature_c.is_finite() {
            return Err(ElecError::invalid_input(
                "temperature_c",
                self.temperature_c.to_string(),
                "Temperatures must be finite",
            ));
        }
        if self.ambient_temperature_c > MAX_AMBIENT_TEMPERATURE_C {
            return Err(ElecError::invalid_input(
                "ambient_temperature_c",
                self.ambient_temperature_c.to_string(),
                "No ampacity correction exists above 70 °C ambient",
            ));
        }
        if self.lifecycle_years == 0 {
            return Err(ElecError::invalid_input(
                "lifecycle_years",
                "0",
                "Lifecycle must be at least one year",
            ));
        }
        Ok(())
    }

    /// Multiplier turning one year's loss cost into lifecycle cost.
    ///
    /// Present-worth factor `(1 − (1 + r)^−n) / r`, or simply `n` when r = 0.
    pub fn present_worth_factor(&self) -> f64 {
        let years = f64::from(self.lifecycle_years);
        let rate = self.discount_rate_percent / 100.0;
        if rate == 0.0 {
            years
        } else {
            (1.0 - (1.0 + rate).powf(-years)) / rate
        }
    }
}
