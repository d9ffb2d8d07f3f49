//! # PEC 2017 Compliance Constants
//!
//! Numeric thresholds from the Philippine Electrical Code (2017 edition)
//! used by the compliance and sizing checks. These are fixed code values,
//! not user settings.

/// Code edition these thresholds are taken from
pub const CODE_EDITION: &str = "PEC 2017";

/// Maximum voltage drop on a branch circuit, percent of nominal voltage
pub const MAX_BRANCH_VOLTAGE_DROP_PERCENT: f64 = 3.0;

/// Maximum voltage drop on a feeder, percent of nominal voltage
pub const MAX_FEEDER_VOLTAGE_DROP_PERCENT: f64 = 2.0;

/// Maximum combined feeder + branch voltage drop, percent
pub const MAX_TOTAL_VOLTAGE_DROP_PERCENT: f64 = 5.0;

/// Phase imbalance at or above this percentage is flagged
pub const MAX_PHASE_IMBALANCE_PERCENT: f64 = 20.0;

/// Overcurrent devices and conductors carry 125% of continuous load
pub const CONTINUOUS_LOAD_FACTOR: f64 = 1.25;

/// Smallest conductor permitted for branch circuits (mm²)
pub const MIN_BRANCH_CONDUCTOR_MM2: f64 = 2.0;

/// Reference temperature for conductor resistivity (°C)
pub const REFERENCE_TEMPERATURE_C: f64 = 20.0;

/// Highest ambient temperature with a correction factor for 75 °C insulation (°C)
pub const MAX_AMBIENT_TEMPERATURE_C: f64 = 70.0;

/// Required rating for a device or conductor serving `current_a` continuously.
pub fn continuous_rating(current_a: f64) -> f64 {
    current_a * CONTINUOUS_LOAD_FACTOR
}
