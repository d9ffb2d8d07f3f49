//! # Conductor Database
//!
//! Standard metric building-wire sizes with ampacity, cost and resistance
//! data, plus overcurrent protection ratings (see [`breakers`]).
//!
//! Ampacities are for copper THHN/THWN at 75 °C insulation rating, not more
//! than three current-carrying conductors in raceway, 30 °C ambient.
//! Aluminum values are derived from copper with fixed factors.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::conductors::{lookup, ConductorMaterial};
//!
//! let size = lookup(5.5).unwrap();
//! let ampacity = size.ampacity_a(ConductorMaterial::Copper, 30.0);
//! assert_eq!(ampacity, 35.0);
//! ```

pub mod breakers;

pub use breakers::{next_standard_breaker, recommend_circuit, CircuitRecommendation, STANDARD_BREAKER_RATINGS_A};

use serde::{Deserialize, Serialize};

use crate::errors::{ElecError, ElecResult};
use crate::standards::{MAX_AMBIENT_TEMPERATURE_C, REFERENCE_TEMPERATURE_C};

/// Conductor material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConductorMaterial {
    #[default]
    Copper,
    Aluminum,
}

impl ConductorMaterial {
    /// Resistivity at 20 °C in Ω·mm²/m
    pub fn resistivity_20c(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 0.017241,
            ConductorMaterial::Aluminum => 0.028264,
        }
    }

    /// Temperature coefficient of resistance α (per °C) at 20 °C
    pub fn temperature_coefficient(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 0.00393,
            ConductorMaterial::Aluminum => 0.00403,
        }
    }

    /// Ampacity relative to a copper conductor of the same size
    pub fn ampacity_factor(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 1.0,
            ConductorMaterial::Aluminum => 0.78,
        }
    }

    /// Price relative to a copper conductor of the same size
    pub fn cost_factor(&self) -> f64 {
        match self {
            ConductorMaterial::Copper => 1.0,
            ConductorMaterial::Aluminum => 0.45,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "Copper",
            ConductorMaterial::Aluminum => "Aluminum",
        }
    }

    /// Parse from common string representations ("Cu", "copper", "AL", ...)
    pub fn from_str_flexible(s: &str) -> ElecResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "cu" | "copper" => Ok(ConductorMaterial::Copper),
            "al" | "aluminum" | "aluminium" => Ok(ConductorMaterial::Aluminum),
            other => Err(ElecError::invalid_input(
                "material",
                other,
                "Expected 'copper' or 'aluminum'",
            )),
        }
    }
}

impl std::fmt::Display for ConductorMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One row of the standard conductor size table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorSize {
    /// Nominal cross-section (mm²)
    pub size_mm2: f64,
    /// Copper ampacity at 30 °C ambient (A)
    pub copper_ampacity_a: f64,
    /// Installed copper conductor price per metre (PHP)
    pub copper_cost_per_m: f64,
}

const fn size(size_mm2: f64, copper_ampacity_a: f64, copper_cost_per_m: f64) -> ConductorSize {
    ConductorSize {
        size_mm2,
        copper_ampacity_a,
        copper_cost_per_m,
    }
}

/// Standard metric conductor sizes, smallest first
pub const STANDARD_SIZES: [ConductorSize; 19] = [
    size(2.0, 20.0, 22.0),
    size(3.5, 25.0, 35.0),
    size(5.5, 35.0, 55.0),
    size(8.0, 50.0, 85.0),
    size(14.0, 65.0, 140.0),
    size(22.0, 85.0, 215.0),
    size(30.0, 100.0, 290.0),
    size(38.0, 115.0, 370.0),
    size(50.0, 150.0, 480.0),
    size(60.0, 175.0, 580.0),
    size(80.0, 200.0, 770.0),
    size(100.0, 230.0, 960.0),
    size(125.0, 255.0, 1200.0),
    size(150.0, 285.0, 1440.0),
    size(200.0, 335.0, 1920.0),
    size(250.0, 380.0, 2400.0),
    size(325.0, 420.0, 3120.0),
    size(400.0, 475.0, 3840.0),
    size(500.0, 545.0, 4800.0),
];

impl ConductorSize {
    /// Ampacity for a material at an ambient temperature (°C)
    pub fn ampacity_a(&self, material: ConductorMaterial, ambient_c: f64) -> f64 {
        self.copper_ampacity_a * material.ampacity_factor() * ambient_correction_factor(ambient_c)
    }

    /// Price per metre of one conductor
    pub fn cost_per_m(&self, material: ConductorMaterial) -> f64 {
        self.copper_cost_per_m * material.cost_factor()
    }

    /// Resistance per metre of one conductor at `temperature_c`
    pub fn resistance_ohm_per_m(&self, material: ConductorMaterial, temperature_c: f64) -> f64 {
        resistance_ohm_per_m(self.size_mm2, material, temperature_c)
    }
}

/// Find a standard size by its nominal cross-section.
pub fn lookup(size_mm2: f64) -> ElecResult<&'static ConductorSize> {
    STANDARD_SIZES
        .iter()
        .find(|s| (s.size_mm2 - size_mm2).abs() < 1e-6)
        .ok_or(ElecError::ConductorNotFound { size_mm2 })
}

/// Conductor resistance per metre: R = ρ/A × (1 + α(T − 20)).
///
/// A non-positive cross-section yields 0.
pub fn resistance_ohm_per_m(size_mm2: f64, material: ConductorMaterial, temperature_c: f64) -> f64 {
    if size_mm2 <= 0.0 {
        return 0.0;
    }
    let r20 = material.resistivity_20c() / size_mm2;
    r20 * (1.0 + material.temperature_coefficient() * (temperature_c - REFERENCE_TEMPERATURE_C))
}

/// Ambient temperature correction for 75 °C rated insulation.
///
/// Returns 0 above 70 °C, where the insulation may not be used.
pub fn ambient_correction_factor(ambient_c: f64) -> f64 {
    const TABLE: [(f64, f64); 11] = [
        (10.0, 1.20),
        (15.0, 1.15),
        (20.0, 1.11),
        (25.0, 1.05),
        (30.0, 1.00),
        (35.0, 0.94),
        (40.0, 0.88),
        (45.0, 0.82),
        (50.0, 0.75),
        (55.0, 0.67),
        (60.0, 0.58),
    ];
    for (upper_c, factor) in TABLE {
        if ambient_c <= upper_c {
            return factor;
        }
    }
    if ambient_c <= MAX_AMBIENT_TEMPERATURE_C {
        0.33
    } else {
        0.0
    }
}

/// Smallest standard size whose derated ampacity reaches `required_a`.
pub fn smallest_size_for(
    required_a: f64,
    material: ConductorMaterial,
    ambient_c: f64,
) -> Option<&'static ConductorSize> {
    STANDARD_SIZES
        .iter()
        .find(|s| s.ampacity_a(material, ambient_c) >= required_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(14.0).unwrap().copper_ampacity_a, 65.0);
        assert!(matches!(lookup(7.0), Err(ElecError::ConductorNotFound { .. })));
    }

    #[test]
    fn test_table_is_sorted() {
        for pair in STANDARD_SIZES.windows(2) {
            assert!(pair[0].size_mm2 < pair[1].size_mm2);
            assert!(pair[0].copper_ampacity_a < pair[1].copper_ampacity_a);
            assert!(pair[0].copper_cost_per_m < pair[1].copper_cost_per_m);
        }
    }

    #[test]
    fn test_resistance_at_reference_temperature() {
        // 3.5 mm² copper: 0.017241 / 3.5 = 4.926 mΩ/m
        let r = resistance_ohm_per_m(3.5, ConductorMaterial::Copper, 20.0);
        assert!((r - 0.004926).abs() < 1e-6);
    }

    #[test]
    fn test_resistance_rises_with_temperature() {
        let cold = resistance_ohm_per_m(8.0, ConductorMaterial::Copper, 20.0);
        let hot = resistance_ohm_per_m(8.0, ConductorMaterial::Copper, 75.0);
        assert!((hot / cold - (1.0 + 0.00393 * 55.0)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_size_resistance() {
        assert_eq!(resistance_ohm_per_m(0.0, ConductorMaterial::Aluminum, 30.0), 0.0);
    }

    #[test]
    fn test_ambient_correction() {
        assert_eq!(ambient_correction_factor(30.0), 1.0);
        assert_eq!(ambient_correction_factor(38.0), 0.88);
        assert_eq!(ambient_correction_factor(65.0), 0.33);
        assert_eq!(ambient_correction_factor(80.0), 0.0);
    }

    #[test]
    fn test_aluminum_derating() {
        let s = lookup(22.0).unwrap();
        assert!((s.ampacity_a(ConductorMaterial::Aluminum, 30.0) - 66.3).abs() < 1e-9);
        assert!((s.cost_per_m(ConductorMaterial::Aluminum) - 96.75).abs() < 1e-9);
    }

    #[test]
    fn test_smallest_size_for() {
        assert_eq!(smallest_size_for(30.0, ConductorMaterial::Copper, 30.0).unwrap().size_mm2, 5.5);
        // 40 °C ambient: 5.5 mm² drops to 30.8 A, so 8.0 mm² is needed for 32 A
        assert_eq!(smallest_size_for(32.0, ConductorMaterial::Copper, 40.0).unwrap().size_mm2, 8.0);
        assert!(smallest_size_for(10_000.0, ConductorMaterial::Copper, 30.0).is_none());
    }

    #[test]
    fn test_material_parsing() {
        assert_eq!(ConductorMaterial::from_str_flexible("Cu").unwrap(), ConductorMaterial::Copper);
        assert_eq!(ConductorMaterial::from_str_flexible("aluminium").unwrap(), ConductorMaterial::Aluminum);
        assert!(ConductorMaterial::from_str_flexible("gold").is_err());
        assert_eq!(serde_json::to_string(&ConductorMaterial::Aluminum).unwrap(), "\"aluminum\"");
    }
}
