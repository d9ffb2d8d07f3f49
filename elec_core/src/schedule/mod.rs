//! # Panel Load Schedule
//!
//! A [`LoadSchedule`] is the root container for one electrical panel: its
//! supply parameters, its ordered load items and the aggregate totals.
//!
//! ## Structure
//!
//! ```text
//! LoadSchedule
//! ├── panel_name, system_voltage, power_factor, phase_configuration
//! ├── items: Vec<LoadItem> (display order)
//! ├── totals: ScheduleTotals (always the sum of items)
//! ├── feeder: Option<FeederSettings>
//! └── compliant: Option<bool> (last compliance evaluation)
//! ```
//!
//! Totals are recomputed synchronously by every mutating method, so
//! [`LoadSchedule::totals`] is never stale.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::schedule::{LoadItemInput, LoadSchedule, PhaseConfiguration};
//!
//! let mut panel = LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap();
//! let id = panel.add_item(LoadItemInput::new("Receptacles", 2, 100.0, 0.8)).unwrap();
//!
//! assert_eq!(panel.totals().connected_load_w, 200.0);
//! panel.remove_item(&id);
//! assert_eq!(panel.totals().connected_load_w, 0.0);
//! ```

pub mod item;

pub use item::{
    CircuitInfo, LoadItem, LoadItemInput, LoadItemPatch, Phase, PhaseAssignment, PhaseConfiguration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculations::compliance::ComplianceResult;
use crate::conductors::ConductorMaterial;
use crate::errors::{ElecError, ElecResult};

/// Current schema version for schedule files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Aggregate quantities over all items of a schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub item_count: usize,
    pub connected_load_w: f64,
    pub demand_load_w: f64,
    pub current_a: f64,
    pub volt_ampere: f64,
}

impl ScheduleTotals {
    fn from_items(items: &[LoadItem]) -> Self {
        items.iter().fold(
            ScheduleTotals {
                item_count: items.len(),
                ..ScheduleTotals::default()
            },
            |mut acc, item| {
                acc.connected_load_w += item.connected_load_w;
                acc.demand_load_w += item.demand_load_w;
                acc.current_a += item.current_a;
                acc.volt_ampere += item.volt_ampere;
                acc
            },
        )
    }
}

/// Feeder serving the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederSettings {
    /// Feeder conductor size (mm²)
    pub conductor_mm2: f64,
    /// One-way feeder length (m)
    pub length_m: f64,
    #[serde(default)]
    pub material: ConductorMaterial,
    /// Main breaker trip rating (A)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_breaker_a: Option<f64>,
}

impl FeederSettings {
    pub fn validate(&self) -> ElecResult<()> {
        if !self.conductor_mm2.is_finite() || self.conductor_mm2 <= 0.0 {
            return Err(ElecError::invalid_input(
                "feeder.conductor_mm2",
                self.conductor_mm2.to_string(),
                "Conductor size must be positive",
            ));
        }
        if !self.length_m.is_finite() || self.length_m < 0.0 {
            return Err(ElecError::invalid_input(
                "feeder.length_m",
                self.length_m.to_string(),
                "Feeder length cannot be negative",
            ));
        }
        if let Some(breaker) = self.main_breaker_a {
            if !breaker.is_finite() || breaker <= 0.0 {
                return Err(ElecError::invalid_input(
                    "feeder.main_breaker_a",
                    breaker.to_string(),
                    "Main breaker rating must be positive",
                ));
            }
        }
        Ok(())
    }
}

/// One panel's load schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSchedule {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub panel_name: String,
    /// Nominal system voltage (V)
    system_voltage: f64,
    power_factor: f64,
    pub phase_configuration: PhaseConfiguration,
    items: Vec<LoadItem>,
    #[serde(default)]
    totals: ScheduleTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feeder: Option<FeederSettings>,
    /// Panel-level result of the last compliance evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliant: Option<bool>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl LoadSchedule {
    /// Create an empty schedule.
    ///
    /// Fails if the voltage is not positive or the power factor is outside (0, 1].
    pub fn new(
        panel_name: impl Into<String>,
        system_voltage: f64,
        power_factor: f64,
        phase_configuration: PhaseConfiguration,
    ) -> ElecResult<Self> {
        validate_voltage(system_voltage)?;
        validate_power_factor(power_factor)?;
        let now = Utc::now();
        Ok(LoadSchedule {
            version: SCHEMA_VERSION.to_string(),
            panel_name: panel_name.into(),
            system_voltage,
            power_factor,
            phase_configuration,
            items: Vec::new(),
            totals: ScheduleTotals::default(),
            feeder: None,
            compliant: None,
            created: now,
            modified: now,
        })
    }

    /// Parse a schedule from JSON and rebuild all derived values.
    ///
    /// Stored compliance results survive the reload.
    pub fn from_json(json: &str) -> ElecResult<Self> {
        let mut schedule: LoadSchedule = serde_json::from_str(json).map_err(ElecError::serialization)?;
        schedule.validate()?;
        schedule.refresh();
        Ok(schedule)
    }

    /// Check supply parameters and every item.
    pub fn validate(&self) -> ElecResult<()> {
        validate_voltage(self.system_voltage)?;
        validate_power_factor(self.power_factor)?;
        if let Some(feeder) = &self.feeder {
            feeder.validate()?;
        }
        for item in &self.items {
            item.input().validate()?;
        }
        Ok(())
    }

    pub fn system_voltage(&self) -> f64 {
        self.system_voltage
    }

    pub fn power_factor(&self) -> f64 {
        self.power_factor
    }

    pub fn items(&self) -> &[LoadItem] {
        &self.items
    }

    pub fn totals(&self) -> &ScheduleTotals {
        &self.totals
    }

    pub fn feeder(&self) -> Option<&FeederSettings> {
        self.feeder.as_ref()
    }

    pub fn is_three_phase(&self) -> bool {
        self.phase_configuration == PhaseConfiguration::ThreePhase
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&LoadItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Validate and append a new item; returns its generated id.
    ///
    /// On a validation error the schedule is unchanged.
    pub fn add_item(&mut self, input: LoadItemInput) -> ElecResult<Uuid> {
        input.validate()?;
        let id = Uuid::new_v4();
        let item = LoadItem::from_input(id, input, self.system_voltage, self.power_factor);
        debug!(panel = %self.panel_name, %id, description = %item.description, "adding load item");
        self.items.push(item);
        self.after_mutation();
        Ok(id)
    }

    /// Apply a patch to an existing item, keeping its position.
    pub fn update_item(&mut self, id: &Uuid, patch: &LoadItemPatch) -> ElecResult<&LoadItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == *id)
            .ok_or(ElecError::ItemNotFound { id: *id })?;

        let mut input = self.items[index].input();
        patch.apply_to(&mut input);
        input.validate()?;

        debug!(panel = %self.panel_name, %id, "updating load item");
        self.items[index] = LoadItem::from_input(*id, input, self.system_voltage, self.power_factor);
        self.after_mutation();
        Ok(&self.items[index])
    }

    /// Remove an item. Returns `None` (and changes nothing) if the id is absent.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<LoadItem> {
        let index = self.items.iter().position(|item| item.id == *id)?;
        let removed = self.items.remove(index);
        debug!(panel = %self.panel_name, %id, "removed load item");
        self.after_mutation();
        Some(removed)
    }

    /// Change the nominal voltage; every item's current is recalculated.
    pub fn set_system_voltage(&mut self, system_voltage: f64) -> ElecResult<()> {
        validate_voltage(system_voltage)?;
        self.system_voltage = system_voltage;
        self.refresh();
        self.invalidate_compliance();
        self.touch();
        Ok(())
    }

    /// Change the power factor; every item's VA is recalculated.
    pub fn set_power_factor(&mut self, power_factor: f64) -> ElecResult<()> {
        validate_power_factor(power_factor)?;
        self.power_factor = power_factor;
        self.refresh();
        self.invalidate_compliance();
        self.touch();
        Ok(())
    }

    pub fn set_feeder(&mut self, feeder: Option<FeederSettings>) -> ElecResult<()> {
        if let Some(f) = &feeder {
            f.validate()?;
        }
        self.feeder = feeder;
        self.invalidate_compliance();
        self.touch();
        Ok(())
    }

    /// Recompute every item's derived fields and the totals.
    pub fn refresh(&mut self) {
        for item in &mut self.items {
            item.recompute(self.system_voltage, self.power_factor);
        }
        self.recompute_totals();
    }

    /// Forget every stored compliance result, per item and for the panel.
    pub fn invalidate_compliance(&mut self) {
        for item in &mut self.items {
            item.clear_compliance();
        }
        self.compliant = None;
    }

    /// Recompute aggregate totals from the current items.
    pub fn recompute_totals(&mut self) {
        self.totals = ScheduleTotals::from_items(&self.items);
    }

    /// Store per-item voltage drop / pass flags and the panel flag.
    pub fn apply_compliance(&mut self, result: &ComplianceResult) {
        for item in &mut self.items {
            if let Some(check) = result.items.iter().find(|c| c.item_id == item.id) {
                item.voltage_drop_percent = check.voltage_drop_percent;
                item.compliant = Some(check.compliant);
            }
        }
        self.compliant = Some(result.compliant);
        self.touch();
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Item set changed: the panel verdict is stale, other items' results are not.
    fn after_mutation(&mut self) {
        self.compliant = None;
        self.recompute_totals();
        self.touch();
    }
}

fn validate_voltage(system_voltage: f64) -> ElecResult<()> {
    if !system_voltage.is_finite() || system_voltage <= 0.0 {
        return Err(ElecError::invalid_input(
            "system_voltage",
            system_voltage.to_string(),
            "System voltage must be positive",
        ));
    }
    Ok(())
}

fn validate_power_factor(power_factor: f64) -> ElecResult<()> {
    if !power_factor.is_finite() || power_factor <= 0.0 || power_factor > 1.0 {
        return Err(ElecError::invalid_input(
            "power_factor",
            power_factor.to_string(),
            "Power factor must be greater than 0 and at most 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> LoadSchedule {
        LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap()
    }

    fn assert_totals_match(schedule: &LoadSchedule) {
        let connected: f64 = schedule.items().iter().map(|i| i.connected_load_w).sum();
        let demand: f64 = schedule.items().iter().map(|i| i.demand_load_w).sum();
        let current: f64 = schedule.items().iter().map(|i| i.current_a).sum();
        let totals = schedule.totals();
        assert_eq!(totals.item_count, schedule.items().len());
        assert!((totals.connected_load_w - connected).abs() < 1e-9);
        assert!((totals.demand_load_w - demand).abs() < 1e-9);
        assert!((totals.current_a - current).abs() < 1e-9);
    }

    #[test]
    fn test_new_validates_supply() {
        assert!(LoadSchedule::new("X", 0.0, 0.85, PhaseConfiguration::SinglePhase).is_err());
        assert!(LoadSchedule::new("X", 230.0, 1.5, PhaseConfiguration::SinglePhase).is_err());
        assert!(LoadSchedule::new("X", 230.0, 0.0, PhaseConfiguration::SinglePhase).is_err());
    }

    #[test]
    fn test_add_item_computes_fields_and_totals() {
        let mut schedule = panel();
        let id = schedule.add_item(LoadItemInput::new("Receptacles", 2, 100.0, 0.8)).unwrap();

        let item = schedule.get_item(&id).unwrap();
        assert_eq!(item.connected_load_w, 200.0);
        assert!((item.demand_load_w - 160.0).abs() < 1e-9);
        assert!((item.current_a - 0.696).abs() < 0.001);

        assert_eq!(schedule.totals().connected_load_w, 200.0);
        assert!((schedule.totals().demand_load_w - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_add_has_no_side_effects() {
        let mut schedule = panel();
        schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let before = *schedule.totals();

        let err = schedule.add_item(LoadItemInput::new("", 1, 100.0, 1.0)).unwrap_err();
        assert!(err.is_validation());
        assert!(schedule.add_item(LoadItemInput::new("Heater", 1, 0.0, 1.0)).is_err());

        assert_eq!(schedule.items().len(), 1);
        assert_eq!(*schedule.totals(), before);
    }

    #[test]
    fn test_update_item_in_place() {
        let mut schedule = panel();
        let first = schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let second = schedule.add_item(LoadItemInput::new("Fans", 4, 60.0, 0.5)).unwrap();

        let patch = LoadItemPatch {
            rating_w: Some(30.0),
            ..LoadItemPatch::default()
        };
        let updated = schedule.update_item(&first, &patch).unwrap();
        assert_eq!(updated.connected_load_w, 300.0);

        assert_eq!(schedule.items()[0].id, first);
        assert_eq!(schedule.items()[1].id, second);
        assert_totals_match(&schedule);
        assert_eq!(schedule.totals().connected_load_w, 540.0);
    }

    #[test]
    fn test_invalid_update_leaves_item_unchanged() {
        let mut schedule = panel();
        let id = schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let patch = LoadItemPatch {
            description: Some(" ".to_string()),
            ..LoadItemPatch::default()
        };
        assert!(schedule.update_item(&id, &patch).is_err());
        assert_eq!(schedule.get_item(&id).unwrap().description, "Lights");

        let missing = Uuid::new_v4();
        assert_eq!(
            schedule.update_item(&missing, &LoadItemPatch::default()).unwrap_err(),
            ElecError::ItemNotFound { id: missing }
        );
    }

    #[test]
    fn test_remove_only_item_resets_totals() {
        let mut schedule = panel();
        let id = schedule.add_item(LoadItemInput::new("Pump", 1, 750.0, 1.0)).unwrap();
        assert!(schedule.remove_item(&id).is_some());
        assert_eq!(schedule.totals().connected_load_w, 0.0);
        assert_eq!(schedule.totals().demand_load_w, 0.0);
        assert_eq!(schedule.totals().current_a, 0.0);
        assert_eq!(schedule.totals().item_count, 0);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut schedule = panel();
        schedule.add_item(LoadItemInput::new("Pump", 1, 750.0, 1.0)).unwrap();
        assert!(schedule.remove_item(&Uuid::new_v4()).is_none());
        assert_eq!(schedule.items().len(), 1);
        assert_totals_match(&schedule);
    }

    #[test]
    fn test_voltage_change_recomputes_currents() {
        let mut schedule = panel();
        schedule.add_item(LoadItemInput::new("Heater", 1, 2300.0, 1.0)).unwrap();
        assert!((schedule.totals().current_a - 10.0).abs() < 1e-9);

        schedule.set_system_voltage(115.0).unwrap();
        assert!((schedule.items()[0].current_a - 20.0).abs() < 1e-9);
        assert_totals_match(&schedule);

        assert!(schedule.set_system_voltage(-1.0).is_err());
        assert_eq!(schedule.system_voltage(), 115.0);
    }

    #[test]
    fn test_power_factor_change_recomputes_va() {
        let mut schedule = panel();
        schedule.add_item(LoadItemInput::new("Motor", 1, 1700.0, 1.0)).unwrap();
        assert!((schedule.totals().volt_ampere - 2000.0).abs() < 1e-9);

        schedule.set_power_factor(1.0).unwrap();
        assert!((schedule.items()[0].volt_ampere - 1700.0).abs() < 1e-9);
        assert!((schedule.totals().volt_ampere - 1700.0).abs() < 1e-9);
        assert!((schedule.items()[0].current_a - 1700.0 / 230.0).abs() < 1e-9);

        assert!(schedule.set_power_factor(1.2).is_err());
        assert_eq!(schedule.power_factor(), 1.0);
    }

    #[test]
    fn test_supply_change_clears_stored_compliance() {
        let mut schedule = panel();
        let id = schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let result = crate::calculations::evaluate_compliance(
            &schedule,
            &crate::calculations::AnalysisParameters::default(),
        )
        .unwrap();
        schedule.apply_compliance(&result);
        assert_eq!(schedule.compliant, Some(true));
        assert_eq!(schedule.get_item(&id).unwrap().compliant, Some(true));

        schedule.refresh();
        assert_eq!(schedule.get_item(&id).unwrap().compliant, Some(true));

        schedule.set_power_factor(0.9).unwrap();
        assert_eq!(schedule.compliant, None);
        assert_eq!(schedule.get_item(&id).unwrap().compliant, None);
    }

    #[test]
    fn test_json_reload_rebuilds_totals() {
        let mut schedule = panel();
        schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let mut value = serde_json::to_value(&schedule).unwrap();
        value["totals"]["connected_load_w"] = serde_json::json!(999.0);

        let reloaded = LoadSchedule::from_json(&value.to_string()).unwrap();
        assert_eq!(reloaded.totals().connected_load_w, 200.0);
    }

    #[test]
    fn test_feeder_validation() {
        let mut schedule = panel();
        let bad = FeederSettings {
            conductor_mm2: 0.0,
            length_m: 10.0,
            material: ConductorMaterial::Copper,
            main_breaker_a: None,
        };
        assert!(schedule.set_feeder(Some(bad)).is_err());
        assert!(schedule.feeder().is_none());
    }
}
