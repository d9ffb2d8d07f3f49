//! Load items: one row of a panel schedule.
//!
//! A [`LoadItemInput`] carries what the user types; a [`LoadItem`] adds the
//! id and the derived electrical quantities. Derived fields are only ever
//! written by [`LoadItem::from_input`] and [`LoadItem::recompute`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ElecError, ElecResult};

/// Panel supply arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseConfiguration {
    #[default]
    SinglePhase,
    ThreePhase,
}

impl PhaseConfiguration {
    pub fn display_name(&self) -> &'static str {
        match self {
            PhaseConfiguration::SinglePhase => "1-phase",
            PhaseConfiguration::ThreePhase => "3-phase",
        }
    }

    /// Parse "1", "single", "3", "three-phase", ...
    pub fn from_str_flexible(s: &str) -> ElecResult<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "1" | "1ph" | "1-phase" | "single" | "single-phase" => Ok(PhaseConfiguration::SinglePhase),
            "3" | "3ph" | "3-phase" | "three" | "three-phase" => Ok(PhaseConfiguration::ThreePhase),
            other => Err(ElecError::invalid_input(
                "phase_configuration",
                other,
                "Expected 'single' or 'three'",
            )),
        }
    }
}

/// A single line of a three-phase system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        };
        write!(f, "{}", s)
    }
}

/// Which phase(s) a circuit is connected to.
///
/// Single letters are 1-pole circuits, pairs are 2-pole, `ABC` is 3-pole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhaseAssignment {
    #[default]
    A,
    B,
    C,
    AB,
    BC,
    CA,
    ABC,
}

impl PhaseAssignment {
    /// Phases the circuit draws current from
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            PhaseAssignment::A => &[Phase::A],
            PhaseAssignment::B => &[Phase::B],
            PhaseAssignment::C => &[Phase::C],
            PhaseAssignment::AB => &[Phase::A, Phase::B],
            PhaseAssignment::BC => &[Phase::B, Phase::C],
            PhaseAssignment::CA => &[Phase::C, Phase::A],
            PhaseAssignment::ABC => &[Phase::A, Phase::B, Phase::C],
        }
    }

    /// Number of breaker poles
    pub fn poles(&self) -> usize {
        self.phases().len()
    }
}

/// Optional branch-circuit metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitInfo {
    /// Breaker trip rating (A)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaker_a: Option<f64>,

    /// Conductor cross-section (mm²)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductor_mm2: Option<f64>,

    /// Insulation/wire type label (e.g., "THHN")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_type: Option<String>,

    /// One-way circuit length (m); falls back to the analysis default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
}

impl CircuitInfo {
    fn validate(&self) -> ElecResult<()> {
        let checks = [
            ("breaker_a", self.breaker_a),
            ("conductor_mm2", self.conductor_mm2),
        ];
        for (field, value) in checks {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ElecError::invalid_input(field, v.to_string(), "Must be positive"));
                }
            }
        }
        if let Some(len) = self.length_m {
            if !len.is_finite() || len < 0.0 {
                return Err(ElecError::invalid_input(
                    "length_m",
                    len.to_string(),
                    "Circuit length cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// User-entered fields of a load item.
///
/// ## JSON Example
///
/// ```json
/// {
///   "description": "LED downlight",
///   "quantity": 12,
///   "rating_w": 15.0,
///   "demand_factor": 1.0,
///   "phase": "A",
///   "circuit": { "breaker_a": 15.0, "conductor_mm2": 2.0, "length_m": 25.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadItemInput {
    pub description: String,
    pub quantity: u32,
    /// Unit rating (W)
    pub rating_w: f64,
    /// Fraction of connected load expected simultaneously (0–1)
    pub demand_factor: f64,
    #[serde(default)]
    pub phase: PhaseAssignment,
    #[serde(default)]
    pub circuit: CircuitInfo,
}

impl LoadItemInput {
    pub fn new(description: impl Into<String>, quantity: u32, rating_w: f64, demand_factor: f64) -> Self {
        LoadItemInput {
            description: description.into(),
            quantity,
            rating_w,
            demand_factor,
            phase: PhaseAssignment::default(),
            circuit: CircuitInfo::default(),
        }
    }

    pub fn with_phase(mut self, phase: PhaseAssignment) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitInfo) -> Self {
        self.circuit = circuit;
        self
    }

    /// Validate input parameters.
    pub fn validate(&self) -> ElecResult<()> {
        if self.description.trim().is_empty() {
            return Err(ElecError::missing_field("description"));
        }
        if !self.rating_w.is_finite() || self.rating_w <= 0.0 {
            return Err(ElecError::invalid_input(
                "rating_w",
                self.rating_w.to_string(),
                "Rating must be positive",
            ));
        }
        if self.quantity == 0 {
            return Err(ElecError::invalid_input("quantity", "0", "Quantity must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.demand_factor) {
            return Err(ElecError::invalid_input(
                "demand_factor",
                self.demand_factor.to_string(),
                "Demand factor must be between 0 and 1",
            ));
        }
        self.circuit.validate()
    }
}

/// Partial update for [`LoadItem`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadItemPatch {
    pub description: Option<String>,
    pub quantity: Option<u32>,
    pub rating_w: Option<f64>,
    pub demand_factor: Option<f64>,
    pub phase: Option<PhaseAssignment>,
    pub circuit: Option<CircuitInfo>,
}

impl LoadItemPatch {
    pub fn apply_to(&self, input: &mut LoadItemInput) {
        if let Some(description) = &self.description {
            input.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        if let Some(rating_w) = self.rating_w {
            input.rating_w = rating_w;
        }
        if let Some(demand_factor) = self.demand_factor {
            input.demand_factor = demand_factor;
        }
        if let Some(phase) = self.phase {
            input.phase = phase;
        }
        if let Some(circuit) = &self.circuit {
            input.circuit = circuit.clone();
        }
    }
}

/// A load item with its derived electrical quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadItem {
    pub id: Uuid,
    pub description: String,
    pub quantity: u32,
    pub rating_w: f64,
    pub demand_factor: f64,
    #[serde(default)]
    pub phase: PhaseAssignment,
    #[serde(default)]
    pub circuit: CircuitInfo,

    /// quantity × rating (W)
    pub connected_load_w: f64,
    /// connected load × demand factor (W)
    pub demand_load_w: f64,
    /// demand load / system voltage (A)
    pub current_a: f64,
    /// demand load / power factor (VA)
    pub volt_ampere: f64,

    /// Branch voltage drop from the last compliance evaluation (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_drop_percent: Option<f64>,
    /// Result of the last compliance evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliant: Option<bool>,
}

impl LoadItem {
    /// Build an item from validated input. Does not validate.
    pub fn from_input(id: Uuid, input: LoadItemInput, system_voltage: f64, power_factor: f64) -> Self {
        let mut item = LoadItem {
            id,
            description: input.description.trim().to_string(),
            quantity: input.quantity,
            rating_w: input.rating_w,
            demand_factor: input.demand_factor,
            phase: input.phase,
            circuit: input.circuit,
            connected_load_w: 0.0,
            demand_load_w: 0.0,
            current_a: 0.0,
            volt_ampere: 0.0,
            voltage_drop_percent: None,
            compliant: None,
        };
        item.recompute(system_voltage, power_factor);
        item
    }

    /// Recalculate connected/demand load, current and VA.
    ///
    /// Stored compliance results are left alone; see [`LoadItem::clear_compliance`].
    pub fn recompute(&mut self, system_voltage: f64, power_factor: f64) {
        self.connected_load_w = f64::from(self.quantity) * self.rating_w;
        self.demand_load_w = self.connected_load_w * self.demand_factor;
        self.current_a = safe_div(self.demand_load_w, system_voltage);
        self.volt_ampere = safe_div(self.demand_load_w, power_factor);
    }

    /// Drop the results of the last compliance evaluation.
    pub fn clear_compliance(&mut self) {
        self.voltage_drop_percent = None;
        self.compliant = None;
    }

    /// The user-entered fields of this item
    pub fn input(&self) -> LoadItemInput {
        LoadItemInput {
            description: self.description.clone(),
            quantity: self.quantity,
            rating_w: self.rating_w,
            demand_factor: self.demand_factor,
            phase: self.phase,
            circuit: self.circuit.clone(),
        }
    }
}

/// Division that yields 0 instead of NaN/inf for a zero divisor.
pub(crate) fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantities() {
        let input = LoadItemInput::new("Receptacle", 2, 100.0, 0.8);
        let item = LoadItem::from_input(Uuid::new_v4(), input, 230.0, 0.85);
        assert_eq!(item.connected_load_w, 200.0);
        assert!((item.demand_load_w - 160.0).abs() < 1e-9);
        assert!((item.current_a - 0.696).abs() < 0.001);
        assert!((item.volt_ampere - 188.235).abs() < 0.001);
    }

    #[test]
    fn test_zero_divisors_give_zero() {
        let input = LoadItemInput::new("Fan", 1, 75.0, 1.0);
        let item = LoadItem::from_input(Uuid::new_v4(), input, 0.0, 0.0);
        assert_eq!(item.current_a, 0.0);
        assert_eq!(item.volt_ampere, 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(LoadItemInput::new("Lamp", 1, 40.0, 1.0).validate().is_ok());
        assert!(matches!(
            LoadItemInput::new("   ", 1, 40.0, 1.0).validate(),
            Err(ElecError::MissingField { .. })
        ));
        assert!(LoadItemInput::new("Lamp", 1, 0.0, 1.0).validate().is_err());
        assert!(LoadItemInput::new("Lamp", 1, -10.0, 1.0).validate().is_err());
        assert!(LoadItemInput::new("Lamp", 0, 40.0, 1.0).validate().is_err());
        assert!(LoadItemInput::new("Lamp", 1, 40.0, 1.2).validate().is_err());

        let bad_circuit = CircuitInfo {
            breaker_a: Some(-20.0),
            ..CircuitInfo::default()
        };
        assert!(LoadItemInput::new("Lamp", 1, 40.0, 1.0)
            .with_circuit(bad_circuit)
            .validate()
            .is_err());
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut input = LoadItemInput::new("Aircon", 1, 1500.0, 1.0);
        let patch = LoadItemPatch {
            quantity: Some(3),
            phase: Some(PhaseAssignment::AB),
            ..LoadItemPatch::default()
        };
        patch.apply_to(&mut input);
        assert_eq!(input.quantity, 3);
        assert_eq!(input.rating_w, 1500.0);
        assert_eq!(input.phase, PhaseAssignment::AB);
    }

    #[test]
    fn test_phase_assignment_poles() {
        assert_eq!(PhaseAssignment::B.poles(), 1);
        assert_eq!(PhaseAssignment::CA.poles(), 2);
        assert_eq!(PhaseAssignment::ABC.poles(), 3);
    }

    #[test]
    fn test_phase_configuration_parsing() {
        assert_eq!(
            PhaseConfiguration::from_str_flexible("Three Phase").unwrap(),
            PhaseConfiguration::ThreePhase
        );
        assert_eq!(PhaseConfiguration::from_str_flexible("1").unwrap(), PhaseConfiguration::SinglePhase);
        assert!(PhaseConfiguration::from_str_flexible("two").is_err());
    }

    #[test]
    fn test_input_json_defaults() {
        let json = r#"{"description":"Lamp","quantity":4,"rating_w":20.0,"demand_factor":1.0}"#;
        let input: LoadItemInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.phase, PhaseAssignment::A);
        assert_eq!(input.circuit, CircuitInfo::default());
    }
}
