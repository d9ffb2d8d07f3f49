//! # Phase Balance
//!
//! Distributes item currents over phases A/B/C and measures the spread
//! between the most and least loaded phase relative to the average.
//!
//! 1-pole loads go entirely to their phase, 2-pole loads are split in half
//! between their two phases, 3-pole loads in thirds.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ElecError, ElecResult};
use crate::schedule::item::safe_div;
use crate::schedule::{LoadItem, LoadSchedule, Phase};
use crate::standards::MAX_PHASE_IMBALANCE_PERCENT;

/// Phase loading of a three-phase panel.
///
/// ## JSON Example
///
/// ```json
/// {
///   "phase_a_a": 40.0,
///   "phase_b_a": 30.0,
///   "phase_c_a": 20.0,
///   "max_a": 40.0,
///   "min_a": 20.0,
///   "average_a": 30.0,
///   "imbalance_percent": 66.7,
///   "is_balanced": false,
///   "heaviest_phase": "A",
///   "lightest_phase": "C",
///   "recommendation": "Move about 10.0 A of load from phase A to phase C ..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseBalanceResult {
    pub phase_a_a: f64,
    pub phase_b_a: f64,
    pub phase_c_a: f64,
    pub max_a: f64,
    pub min_a: f64,
    pub average_a: f64,
    /// (max − min) / average × 100
    pub imbalance_percent: f64,
    pub is_balanced: bool,
    pub heaviest_phase: Phase,
    pub lightest_phase: Phase,
    /// Present only when imbalance reaches the limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl PhaseBalanceResult {
    pub fn phase_current(&self, phase: Phase) -> f64 {
        match phase {
            Phase::A => self.phase_a_a,
            Phase::B => self.phase_b_a,
            Phase::C => self.phase_c_a,
        }
    }
}

/// Sum item currents into A/B/C buckets.
pub fn phase_currents(items: &[LoadItem]) -> [f64; 3] {
    let mut buckets = [0.0; 3];
    for item in items {
        let phases = item.phase.phases();
        let share = item.current_a / phases.len() as f64;
        for phase in phases {
            buckets[phase_index(*phase)] += share;
        }
    }
    buckets
}

/// Balance metrics for a set of phase currents `[A, B, C]`.
pub fn balance_from_currents(currents: [f64; 3]) -> PhaseBalanceResult {
    let mut heaviest = Phase::A;
    let mut lightest = Phase::A;
    for phase in Phase::ALL {
        let current = currents[phase_index(phase)];
        if current > currents[phase_index(heaviest)] {
            heaviest = phase;
        }
        if current < currents[phase_index(lightest)] {
            lightest = phase;
        }
    }

    let max_a = currents[phase_index(heaviest)];
    let min_a = currents[phase_index(lightest)];
    let average_a = currents.iter().sum::<f64>() / 3.0;
    let imbalance_percent = safe_div(max_a - min_a, average_a) * 100.0;
    let is_balanced = imbalance_percent < MAX_PHASE_IMBALANCE_PERCENT;

    let recommendation = (!is_balanced).then(|| {
        format!(
            "Phase imbalance is {:.1}% (limit {:.0}%). Move about {:.1} A of load from phase {} to phase {}.",
            imbalance_percent,
            MAX_PHASE_IMBALANCE_PERCENT,
            max_a - average_a,
            heaviest,
            lightest
        )
    });

    PhaseBalanceResult {
        phase_a_a: currents[0],
        phase_b_a: currents[1],
        phase_c_a: currents[2],
        max_a,
        min_a,
        average_a,
        imbalance_percent,
        is_balanced,
        heaviest_phase: heaviest,
        lightest_phase: lightest,
        recommendation,
    }
}

/// Phase balance of a three-phase schedule.
///
/// # Returns
///
/// * `Err(ElecError::InvalidInput)` - the schedule is single-phase
pub fn compute_phase_balance(schedule: &LoadSchedule) -> ElecResult<PhaseBalanceResult> {
    if !schedule.is_three_phase() {
        return Err(ElecError::invalid_input(
            "phase_configuration",
            schedule.phase_configuration.display_name(),
            "Phase balance applies to three-phase panels only",
        ));
    }

    let result = balance_from_currents(phase_currents(schedule.items()));
    debug!(
        panel = %schedule.panel_name,
        a = result.phase_a_a,
        b = result.phase_b_a,
        c = result.phase_c_a,
        imbalance = result.imbalance_percent,
        "phase balance computed"
    );
    if !result.is_balanced {
        warn!(panel = %schedule.panel_name, imbalance = result.imbalance_percent, "phase imbalance over limit");
    }
    Ok(result)
}

fn phase_index(phase: Phase) -> usize {
    match phase {
        Phase::A => 0,
        Phase::B => 1,
        Phase::C => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{LoadItemInput, PhaseAssignment, PhaseConfiguration};

    #[test]
    fn test_equal_phases_are_balanced() {
        let result = balance_from_currents([30.0, 30.0, 30.0]);
        assert_eq!(result.imbalance_percent, 0.0);
        assert!(result.is_balanced);
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_unbalanced_phases() {
        let result = balance_from_currents([40.0, 30.0, 20.0]);
        assert!((result.imbalance_percent - 66.667).abs() < 0.01);
        assert!(!result.is_balanced);
        assert_eq!(result.heaviest_phase, Phase::A);
        assert_eq!(result.lightest_phase, Phase::C);
        let text = result.recommendation.unwrap();
        assert!(text.contains("phase A to phase C"));
        assert!(text.contains("10.0 A"));
    }

    #[test]
    fn test_small_imbalance_has_no_recommendation() {
        let result = balance_from_currents([32.0, 30.0, 28.0]);
        assert!((result.imbalance_percent - 13.333).abs() < 0.01);
        assert!(result.is_balanced);
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at_limit = balance_from_currents([33.0, 30.0, 27.0]);
        assert_eq!(at_limit.imbalance_percent, 20.0);
        assert!(!at_limit.is_balanced);
        assert!(at_limit.recommendation.is_some());

        let below = balance_from_currents([32.99, 30.0, 27.01]);
        assert!(below.imbalance_percent < 20.0);
        assert!(below.is_balanced);
        assert!(below.recommendation.is_none());
    }

    #[test]
    fn test_empty_panel_is_balanced() {
        let result = balance_from_currents([0.0, 0.0, 0.0]);
        assert_eq!(result.imbalance_percent, 0.0);
        assert!(result.is_balanced);
    }

    #[test]
    fn test_multi_pole_loads_are_split() {
        let mut schedule = LoadSchedule::new("MDP", 230.0, 0.9, PhaseConfiguration::ThreePhase).unwrap();
        // 6900 W / 230 V = 30 A, split in thirds
        schedule
            .add_item(LoadItemInput::new("Chiller", 1, 6900.0, 1.0).with_phase(PhaseAssignment::ABC))
            .unwrap();
        // 4600 W / 230 V = 20 A, split between A and B
        schedule
            .add_item(LoadItemInput::new("Welder", 1, 4600.0, 1.0).with_phase(PhaseAssignment::AB))
            .unwrap();
        // 2300 W / 230 V = 10 A on C
        schedule
            .add_item(LoadItemInput::new("Heater", 1, 2300.0, 1.0).with_phase(PhaseAssignment::C))
            .unwrap();

        let result = compute_phase_balance(&schedule).unwrap();
        assert!((result.phase_a_a - 20.0).abs() < 1e-9);
        assert!((result.phase_b_a - 20.0).abs() < 1e-9);
        assert!((result.phase_c_a - 20.0).abs() < 1e-9);
        assert!(result.is_balanced);
    }

    #[test]
    fn test_single_phase_schedule_rejected() {
        let schedule = LoadSchedule::new("LP", 230.0, 0.9, PhaseConfiguration::SinglePhase).unwrap();
        assert!(compute_phase_balance(&schedule).is_err());
    }
}
