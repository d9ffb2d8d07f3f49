//! Overcurrent protection ratings and branch-circuit sizing.

use serde::{Deserialize, Serialize};

use super::{smallest_size_for, ConductorMaterial};
use crate::errors::{ElecError, ElecResult};
use crate::standards::continuous_rating;

/// Standard circuit breaker trip ratings (A)
pub const STANDARD_BREAKER_RATINGS_A: [f64; 27] = [
    15.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 125.0, 150.0, 175.0, 200.0,
    225.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 600.0, 700.0, 800.0, 1000.0, 1200.0,
];

/// Smallest standard breaker rating at or above `amps`.
pub fn next_standard_breaker(amps: f64) -> Option<f64> {
    STANDARD_BREAKER_RATINGS_A.iter().copied().find(|&r| r >= amps)
}

/// Breaker and conductor selected for a branch circuit.
///
/// ## JSON Example
///
/// ```json
/// {
///   "current_a": 16.0,
///   "design_current_a": 20.0,
///   "breaker_a": 20.0,
///   "conductor_mm2": 2.0,
///   "conductor_ampacity_a": 20.0,
///   "material": "copper"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRecommendation {
    /// Load current (A)
    pub current_a: f64,
    /// Current × 125% continuous-load factor (A)
    pub design_current_a: f64,
    /// Recommended breaker trip rating (A)
    pub breaker_a: f64,
    /// Recommended conductor size (mm²)
    pub conductor_mm2: f64,
    /// Derated ampacity of the recommended conductor (A)
    pub conductor_ampacity_a: f64,
    pub material: ConductorMaterial,
}

/// Size a breaker and conductor for a continuous load.
///
/// The breaker is the next standard rating at or above 125% of the current;
/// the conductor is the smallest size whose derated ampacity covers the
/// breaker rating.
pub fn recommend_circuit(
    current_a: f64,
    material: ConductorMaterial,
    ambient_c: f64,
) -> ElecResult<CircuitRecommendation> {
    if !current_a.is_finite() || current_a < 0.0 {
        return Err(ElecError::invalid_input(
            "current_a",
            current_a.to_string(),
            "Current must be a non-negative number",
        ));
    }

    let design_current_a = continuous_rating(current_a);
    let breaker_a = next_standard_breaker(design_current_a).ok_or_else(|| {
        ElecError::calculation_failed(
            "circuit sizing",
            format!("{:.1} A exceeds the largest standard breaker", design_current_a),
        )
    })?;
    let conductor = smallest_size_for(breaker_a, material, ambient_c).ok_or_else(|| {
        ElecError::calculation_failed(
            "circuit sizing",
            format!(
                "no standard {} conductor carries {:.0} A at {:.0} °C ambient",
                material.display_name().to_lowercase(),
                breaker_a,
                ambient_c
            ),
        )
    })?;

    Ok(CircuitRecommendation {
        current_a,
        design_current_a,
        breaker_a,
        conductor_mm2: conductor.size_mm2,
        conductor_ampacity_a: conductor.ampacity_a(material, ambient_c),
        material,
    })
}
