//! # PEC 2017 Compliance
//!
//! Evaluates every load item and the panel as a whole against the fixed
//! thresholds in [`crate::standards`].
//!
//! ## Item checks
//!
//! - Branch voltage drop ≤ 3%
//! - Breaker ≥ 125% of load current
//! - Conductor ampacity (ambient corrected) ≥ 125% of load current and ≥ breaker rating
//! - Conductor ≥ 2.0 mm² and a standard size
//!
//! ## Panel checks
//!
//! - Feeder voltage drop ≤ 2%, feeder + worst branch ≤ 5%
//! - Feeder ampacity and main breaker ≥ 125% of feeder current
//! - Phase imbalance < 20% (three-phase panels)
//!
//! Missing circuit data is not a violation; it produces a recommendation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::phase_balance::compute_phase_balance;
use super::voltage_drop::{drop_factor, drop_percent, drop_volts};
use super::AnalysisParameters;
use crate::conductors::{lookup, next_standard_breaker, recommend_circuit, STANDARD_SIZES};
use crate::errors::{ElecError, ElecResult};
use crate::schedule::{LoadItem, LoadSchedule, PhaseConfiguration};
use crate::standards::{
    continuous_rating, CODE_EDITION, MAX_BRANCH_VOLTAGE_DROP_PERCENT, MAX_FEEDER_VOLTAGE_DROP_PERCENT,
    MAX_PHASE_IMBALANCE_PERCENT, MAX_TOTAL_VOLTAGE_DROP_PERCENT, MIN_BRANCH_CONDUCTOR_MM2,
};

/// Compliance outcome for one load item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCompliance {
    pub item_id: Uuid,
    pub description: String,
    pub current_a: f64,
    /// Circuit length used for the voltage drop (m)
    pub length_m: f64,
    /// `None` when the conductor size is unknown
    pub voltage_drop_percent: Option<f64>,
    pub compliant: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Compliance outcome for a whole panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub panel_name: String,
    pub code_edition: String,
    pub items: Vec<ItemCompliance>,
    /// Line current the feeder carries (A)
    pub feeder_current_a: f64,
    pub feeder_voltage_drop_percent: Option<f64>,
    /// Feeder drop plus the worst branch drop
    pub total_voltage_drop_percent: Option<f64>,
    /// Three-phase panels only
    pub phase_imbalance_percent: Option<f64>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub compliant: bool,
}

impl ComplianceResult {
    /// Items that failed at least one check
    pub fn failing_items(&self) -> impl Iterator<Item = &ItemCompliance> {
        self.items.iter().filter(|item| !item.compliant)
    }

    /// Total issue count across items and panel
    pub fn issue_count(&self) -> usize {
        self.issues.len() + self.items.iter().map(|i| i.issues.len()).sum::<usize>()
    }
}

/// Evaluate a schedule. Pure: the schedule is not modified (see
/// [`LoadSchedule::apply_compliance`] to store the flags).
pub fn evaluate_compliance(schedule: &LoadSchedule, params: &AnalysisParameters) -> ElecResult<ComplianceResult> {
    params.validate()?;

    let items: Vec<ItemCompliance> = schedule
        .items()
        .iter()
        .map(|item| check_item(schedule, item, params))
        .collect();

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let mut phase_imbalance_percent = None;
    let feeder_current_a = if schedule.is_three_phase() {
        let balance = compute_phase_balance(schedule)?;
        phase_imbalance_percent = Some(balance.imbalance_percent);
        if !balance.is_balanced {
            issues.push(format!(
                "Phase imbalance {:.1}% reaches the {:.0}% limit",
                balance.imbalance_percent,
                MAX_PHASE_IMBALANCE_PERCENT
            ));
        }
        if let Some(text) = balance.recommendation {
            recommendations.push(text);
        }
        balance.max_a
    } else {
        schedule.totals().current_a
    };

    let mut feeder_voltage_drop_percent = None;
    if let Some(feeder) = schedule.feeder() {
        let factor = match schedule.phase_configuration {
            PhaseConfiguration::ThreePhase => drop_factor(PhaseConfiguration::ThreePhase, 3),
            PhaseConfiguration::SinglePhase => drop_factor(PhaseConfiguration::SinglePhase, 1),
        };
        let drop_v = drop_volts(
            feeder_current_a,
            feeder.length_m,
            feeder.conductor_mm2,
            feeder.material,
            params.temperature_c,
            factor,
        );
        let percent = drop_percent(drop_v, schedule.system_voltage());
        feeder_voltage_drop_percent = Some(percent);
        if percent > MAX_FEEDER_VOLTAGE_DROP_PERCENT {
            issues.push(format!(
                "Feeder voltage drop {:.2}% exceeds {:.0}%",
                percent, MAX_FEEDER_VOLTAGE_DROP_PERCENT
            ));
        }

        let required_a = continuous_rating(feeder_current_a);
        match lookup(feeder.conductor_mm2) {
            Ok(size) => {
                let ampacity = size.ampacity_a(feeder.material, params.ambient_temperature_c);
                if ampacity < required_a {
                    issues.push(format!(
                        "Feeder conductor {} mm² ampacity {:.0} A is below the required {:.1} A",
                        feeder.conductor_mm2, ampacity, required_a
                    ));
                }
                if let Some(main) = feeder.main_breaker_a {
                    if main > ampacity {
                        issues.push(format!(
                            "Main breaker {:.0} A exceeds feeder ampacity {:.0} A",
                            main, ampacity
                        ));
                    }
                }
            }
            Err(_) => issues.push(format!(
                "Feeder conductor {} mm² is not a standard size",
                feeder.conductor_mm2
            )),
        }
        if let Some(main) = feeder.main_breaker_a {
            if main < required_a {
                issues.push(format!(
                    "Main breaker {:.0} A is below 125% of feeder current ({:.1} A)",
                    main, required_a
                ));
                if let Some(next) = next_standard_breaker(required_a) {
                    recommendations.push(format!("Use a {:.0} A main breaker", next));
                }
            }
        }
    }

    let worst_branch = items
        .iter()
        .filter_map(|i| i.voltage_drop_percent)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    let total_voltage_drop_percent = match (feeder_voltage_drop_percent, worst_branch) {
        (Some(f), Some(b)) => Some(f + b),
        (Some(f), None) => Some(f),
        (None, b) => b,
    };
    if let (Some(_), Some(total)) = (feeder_voltage_drop_percent, total_voltage_drop_percent) {
        if total > MAX_TOTAL_VOLTAGE_DROP_PERCENT {
            issues.push(format!(
                "Combined feeder and branch voltage drop {:.2}% exceeds {:.0}%",
                total, MAX_TOTAL_VOLTAGE_DROP_PERCENT
            ));
        }
    }

    let compliant = issues.is_empty() && items.iter().all(|i| i.compliant);
    let result = ComplianceResult {
        panel_name: schedule.panel_name.clone(),
        code_edition: CODE_EDITION.to_string(),
        items,
        feeder_current_a,
        feeder_voltage_drop_percent,
        total_voltage_drop_percent,
        phase_imbalance_percent,
        issues,
        recommendations,
        compliant,
    };

    debug!(
        panel = %result.panel_name,
        items = result.items.len(),
        issues = result.issue_count(),
        "compliance evaluated"
    );
    if !result.compliant {
        warn!(panel = %result.panel_name, issues = result.issue_count(), "panel is not compliant");
    }
    Ok(result)
}

fn check_item(schedule: &LoadSchedule, item: &LoadItem, params: &AnalysisParameters) -> ItemCompliance {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let circuit = &item.circuit;
    let length_m = circuit.length_m.unwrap_or(params.conductor_length_m);
    let required_a = continuous_rating(item.current_a);
    let sizing = recommend_circuit(item.current_a, params.material, params.ambient_temperature_c);
    let suggested = sizing.as_ref().ok();
    let factor = drop_factor(schedule.phase_configuration, item.phase.poles());

    let voltage_drop_percent = circuit.conductor_mm2.map(|size_mm2| {
        let drop_v = drop_volts(item.current_a, length_m, size_mm2, params.material, params.temperature_c, factor);
        drop_percent(drop_v, schedule.system_voltage())
    });

    if let (Some(size_mm2), Some(vd)) = (circuit.conductor_mm2, voltage_drop_percent) {
        if vd > MAX_BRANCH_VOLTAGE_DROP_PERCENT {
            issues.push(format!(
                "Voltage drop {:.2}% exceeds the {:.0}% branch limit",
                vd, MAX_BRANCH_VOLTAGE_DROP_PERCENT
            ));
            let fix = STANDARD_SIZES.iter().find(|s| {
                let drop_v = drop_volts(item.current_a, length_m, s.size_mm2, params.material, params.temperature_c, factor);
                drop_percent(drop_v, schedule.system_voltage()) <= MAX_BRANCH_VOLTAGE_DROP_PERCENT
            });
            match fix {
                Some(s) => recommendations.push(format!(
                    "Increase conductor to {} mm² to keep voltage drop within {:.0}%",
                    s.size_mm2, MAX_BRANCH_VOLTAGE_DROP_PERCENT
                )),
                None => recommendations.push("Shorten the circuit or raise the supply voltage".to_string()),
            }
        }

        if size_mm2 < MIN_BRANCH_CONDUCTOR_MM2 {
            issues.push(format!(
                "Conductor {} mm² is below the {} mm² minimum for branch circuits",
                size_mm2, MIN_BRANCH_CONDUCTOR_MM2
            ));
        }

        match lookup(size_mm2) {
            Ok(size) => {
                let ampacity = size.ampacity_a(params.material, params.ambient_temperature_c);
                if ampacity < required_a {
                    issues.push(format!(
                        "Conductor ampacity {:.1} A is below 125% of load current ({:.1} A)",
                        ampacity, required_a
                    ));
                    if let Some(s) = &suggested {
                        recommendations.push(format!("Use at least {} mm² conductor", s.conductor_mm2));
                    }
                }
                if let Some(breaker) = circuit.breaker_a {
                    if ampacity < breaker {
                        issues.push(format!(
                            "Conductor ampacity {:.1} A is not protected by the {:.0} A breaker",
                            ampacity, breaker
                        ));
                    }
                }
            }
            Err(_) => issues.push(format!("Conductor {} mm² is not a standard size", size_mm2)),
        }
    } else if let Some(s) = &suggested {
        recommendations.push(format!(
            "Specify the conductor size; {} mm² {} is adequate",
            s.conductor_mm2,
            params.material.display_name().to_lowercase()
        ));
    }

    match circuit.breaker_a {
        Some(breaker) if breaker < required_a => {
            issues.push(format!(
                "Breaker {:.0} A is below 125% of load current ({:.1} A)",
                breaker, required_a
            ));
            if let Some(s) = &suggested {
                recommendations.push(format!("Use a {:.0} A breaker", s.breaker_a));
            }
        }
        Some(_) => {}
        None => {
            if let Some(s) = &suggested {
                recommendations.push(format!("Specify the breaker; {:.0} A is adequate", s.breaker_a));
            }
        }
    }

    if let Err(ElecError::CalculationFailed { reason, .. }) = &sizing {
        issues.push(format!("No standard circuit for {:.1} A: {}", item.current_a, reason));
    }

    ItemCompliance {
        item_id: item.id,
        description: item.description.clone(),
        current_a: item.current_a,
        length_m,
        voltage_drop_percent,
        compliant: issues.is_empty(),
        issues,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductors::ConductorMaterial;
    use crate::schedule::{CircuitInfo, FeederSettings, LoadItemInput, PhaseAssignment};

    fn params() -> AnalysisParameters {
        AnalysisParameters {
            temperature_c: 20.0,
            ..AnalysisParameters::default()
        }
    }

    fn circuit(breaker_a: f64, conductor_mm2: f64, length_m: f64) -> CircuitInfo {
        CircuitInfo {
            breaker_a: Some(breaker_a),
            conductor_mm2: Some(conductor_mm2),
            wire_type: Some("THHN".to_string()),
            length_m: Some(length_m),
        }
    }

    fn single_phase() -> LoadSchedule {
        LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap()
    }

    #[test]
    fn test_compliant_branch() {
        let mut schedule = single_phase();
        // 2300 W → 10 A; needs 12.5 A breaker and conductor
        schedule
            .add_item(LoadItemInput::new("Heater", 1, 2300.0, 1.0).with_circuit(circuit(20.0, 3.5, 20.0)))
            .unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        assert!(result.compliant, "{:?}", result);
        let item = &result.items[0];
        // 2 × 10 × 0.004926 × 20 / 230 = 0.857 %
        assert!((item.voltage_drop_percent.unwrap() - 0.857).abs() < 0.01);
        assert!(item.issues.is_empty());
    }

    #[test]
    fn test_excessive_voltage_drop_flags_item() {
        let mut schedule = single_phase();
        schedule
            .add_item(LoadItemInput::new("Pump", 1, 3680.0, 1.0).with_circuit(circuit(20.0, 3.5, 60.0)))
            .unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        assert!(!result.compliant);
        let item = &result.items[0];
        assert!(item.voltage_drop_percent.unwrap() > 3.0);
        assert!(item.issues.iter().any(|i| i.contains("Voltage drop")));
        assert!(item.recommendations.iter().any(|r| r.contains("Increase conductor")));
        assert_eq!(result.failing_items().count(), 1);
    }

    #[test]
    fn test_load_beyond_largest_breaker() {
        let mut schedule = single_phase();
        // 1304 A; 125% exceeds the 1200 A frame
        schedule.add_item(LoadItemInput::new("Chiller", 1, 300_000.0, 1.0)).unwrap();
        schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        let failing: Vec<_> = result.failing_items().map(|i| i.description.as_str()).collect();
        assert_eq!(failing, vec!["Chiller"]);
        assert_eq!(
            result.items[0].issues[0],
            "No standard circuit for 1304.3 A: 1630.4 A exceeds the largest standard breaker"
        );
    }

    #[test]
    fn test_ambient_above_insulation_limit_is_rejected() {
        let mut schedule = single_phase();
        schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();
        let hot = AnalysisParameters {
            ambient_temperature_c: 80.0,
            ..params()
        };
        let err = evaluate_compliance(&schedule, &hot).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_undersized_breaker_and_conductor() {
        let mut schedule = single_phase();
        // 4600 W → 20 A; 125% = 25 A
        schedule
            .add_item(LoadItemInput::new("Range", 1, 4600.0, 1.0).with_circuit(circuit(20.0, 2.0, 5.0)))
            .unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        let item = &result.items[0];
        assert!(!item.compliant);
        assert!(item.issues.iter().any(|i| i.starts_with("Breaker 20 A")));
        assert!(item.issues.iter().any(|i| i.contains("ampacity")));
        assert!(item.recommendations.iter().any(|r| r == "Use a 30 A breaker"));
    }

    #[test]
    fn test_missing_circuit_data_is_only_recommended() {
        let mut schedule = single_phase();
        schedule.add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0)).unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        assert!(result.compliant);
        assert!(result.items[0].voltage_drop_percent.is_none());
        assert_eq!(result.items[0].recommendations.len(), 2);
    }

    #[test]
    fn test_non_standard_conductor() {
        let mut schedule = single_phase();
        schedule
            .add_item(LoadItemInput::new("Lights", 10, 20.0, 1.0).with_circuit(circuit(15.0, 1.5, 5.0)))
            .unwrap();
        let result = evaluate_compliance(&schedule, &params()).unwrap();
        let issues = &result.items[0].issues;
        assert!(issues.iter().any(|i| i.contains("minimum")));
        assert!(issues.iter().any(|i| i.contains("not a standard size")));
    }

    #[test]
    fn test_three_phase_imbalance_is_panel_issue() {
        let mut schedule = LoadSchedule::new("MDP", 230.0, 0.9, PhaseConfiguration::ThreePhase).unwrap();
        schedule
            .add_item(LoadItemInput::new("Motor", 1, 4600.0, 1.0).with_phase(PhaseAssignment::A))
            .unwrap();
        schedule
            .add_item(LoadItemInput::new("Lights", 1, 1150.0, 1.0).with_phase(PhaseAssignment::B))
            .unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        assert!(!result.compliant);
        assert!(result.phase_imbalance_percent.unwrap() >= 20.0);
        assert!(result.issues.iter().any(|i| i.contains("imbalance")));
        assert_eq!(result.recommendations.len(), 1);
        // Feeder carries the heaviest phase
        assert!((result.feeder_current_a - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_feeder_checks() {
        let mut schedule = single_phase();
        schedule
            .add_item(LoadItemInput::new("Heater", 4, 2300.0, 1.0).with_circuit(circuit(60.0, 14.0, 10.0)))
            .unwrap();
        // 40 A total; 125% = 50 A
        schedule
            .set_feeder(Some(FeederSettings {
                conductor_mm2: 8.0,
                length_m: 70.0,
                material: ConductorMaterial::Copper,
                main_breaker_a: Some(40.0),
            }))
            .unwrap();

        let result = evaluate_compliance(&schedule, &params()).unwrap();
        // 2 × 40 × 0.002155 × 70 / 230 = 5.25 %
        assert!((result.feeder_voltage_drop_percent.unwrap() - 5.247).abs() < 0.01);
        assert!(result.issues.iter().any(|i| i.starts_with("Feeder voltage drop")));
        assert!(result.issues.iter().any(|i| i.starts_with("Main breaker 40 A")));
        assert!(result.issues.iter().any(|i| i.starts_with("Combined")));
        assert!(result.recommendations.iter().any(|r| r == "Use a 50 A main breaker"));
        assert!(!result.compliant);
    }

    #[test]
    fn test_apply_compliance_marks_schedule() {
        let mut schedule = single_phase();
        let id = schedule
            .add_item(LoadItemInput::new("Pump", 1, 3680.0, 1.0).with_circuit(circuit(20.0, 3.5, 60.0)))
            .unwrap();
        let result = evaluate_compliance(&schedule, &params()).unwrap();
        schedule.apply_compliance(&result);

        assert_eq!(schedule.compliant, Some(false));
        let item = schedule.get_item(&id).unwrap();
        assert_eq!(item.compliant, Some(false));
        assert!(item.voltage_drop_percent.is_some());
    }
}
