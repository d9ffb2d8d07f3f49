//! # Economic Conductor Sizing
//!
//! Compares candidate conductor sizes for one branch circuit by lifecycle
//! cost: purchase price of the conductors plus the cost of the I²R energy
//! they waste over the analysis period.
//!
//! ```text
//! P_loss   = n × I² × R × L                (W, n = current-carrying conductors)
//! E_year   = P_loss × hours / 1000         (kWh)
//! C_year   = E_year × rate
//! C_life   = material + C_year × PWF       (PWF = years, or present-worth factor)
//! payback  = Δmaterial / ΔC_year           (vs the circuit's current size)
//! ```
//!
//! Only candidates whose ampacity covers 125% of the load current are
//! eligible for the optimum.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::AnalysisParameters;
use crate::conductors::{lookup, ConductorMaterial, ConductorSize, STANDARD_SIZES};
use crate::errors::{ElecError, ElecResult};
use crate::schedule::LoadItem;
use crate::standards::continuous_rating;

/// Economics of one candidate size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorOption {
    pub size_mm2: f64,
    /// Ambient-corrected ampacity (A)
    pub ampacity_a: f64,
    pub sufficient_ampacity: bool,
    /// At operating temperature (Ω/m)
    pub resistance_ohm_per_m: f64,
    pub material_cost: f64,
    pub power_loss_w: f64,
    pub annual_energy_loss_kwh: f64,
    pub annual_loss_cost: f64,
    pub lifecycle_cost: f64,
    /// Years to recover the extra material cost versus the baseline size;
    /// `None` when the size saves nothing on losses
    pub payback_years: Option<f64>,
}

/// Result of [`compare_conductor_sizes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorComparison {
    pub item_id: Uuid,
    pub description: String,
    pub current_a: f64,
    pub required_ampacity_a: f64,
    pub length_m: f64,
    /// Current-carrying conductors in the circuit
    pub conductors: usize,
    pub material: ConductorMaterial,
    /// Size installed now (from the item's circuit data)
    pub current_size_mm2: Option<f64>,
    /// Size payback periods are measured against
    pub baseline_size_mm2: f64,
    /// Candidates, smallest first
    pub options: Vec<ConductorOption>,
    pub optimal_size_mm2: f64,
    /// Annual loss saving of the optimum over the baseline
    pub annual_savings: f64,
    /// Lifecycle saving of the optimum over the baseline
    pub lifecycle_savings: f64,
    pub recommendation: String,
}

impl ConductorComparison {
    pub fn optimal(&self) -> Option<&ConductorOption> {
        self.options
            .iter()
            .find(|o| (o.size_mm2 - self.optimal_size_mm2).abs() < 1e-9)
    }
}

struct Economics {
    ampacity_a: f64,
    resistance_ohm_per_m: f64,
    material_cost: f64,
    power_loss_w: f64,
    annual_energy_loss_kwh: f64,
    annual_loss_cost: f64,
    lifecycle_cost: f64,
}

fn economics(
    size: &ConductorSize,
    current_a: f64,
    length_m: f64,
    conductors: usize,
    params: &AnalysisParameters,
) -> Economics {
    let n = conductors as f64;
    let resistance_ohm_per_m = size.resistance_ohm_per_m(params.material, params.temperature_c);
    let material_cost = size.cost_per_m(params.material) * length_m * n;
    let power_loss_w = n * current_a * current_a * resistance_ohm_per_m * length_m;
    let annual_energy_loss_kwh = power_loss_w * params.operating_hours_per_year / 1000.0;
    let annual_loss_cost = annual_energy_loss_kwh * params.electricity_rate_per_kwh;
    Economics {
        ampacity_a: size.ampacity_a(params.material, params.ambient_temperature_c),
        resistance_ohm_per_m,
        material_cost,
        power_loss_w,
        annual_energy_loss_kwh,
        annual_loss_cost,
        lifecycle_cost: material_cost + annual_loss_cost * params.present_worth_factor(),
    }
}

fn payback_years(option: &Economics, baseline: &Economics) -> Option<f64> {
    let extra_cost = option.material_cost - baseline.material_cost;
    let annual_savings = baseline.annual_loss_cost - option.annual_loss_cost;
    if annual_savings <= 0.0 {
        None
    } else if extra_cost <= 0.0 {
        Some(0.0)
    } else {
        Some(extra_cost / annual_savings)
    }
}

/// Compare `candidate_sizes` (mm²) for `item` and pick the lifecycle optimum.
///
/// # Returns
///
/// * `Err(ElecError::InvalidInput)` - no candidates given
/// * `Err(ElecError::ConductorNotFound)` - a candidate or the installed size is not a standard size
/// * `Err(ElecError::CalculationFailed)` - no candidate has sufficient ampacity
pub fn compare_conductor_sizes(
    item: &LoadItem,
    candidate_sizes: &[f64],
    params: &AnalysisParameters,
) -> ElecResult<ConductorComparison> {
    params.validate()?;
    if candidate_sizes.is_empty() {
        return Err(ElecError::invalid_input(
            "candidate_sizes",
            "[]",
            "At least one candidate size is required",
        ));
    }

    let mut sizes = candidate_sizes
        .iter()
        .map(|&s| lookup(s))
        .collect::<ElecResult<Vec<_>>>()?;
    sizes.sort_by(|a, b| a.size_mm2.total_cmp(&b.size_mm2));
    sizes.dedup_by(|a, b| a.size_mm2 == b.size_mm2);

    let length_m = item.circuit.length_m.unwrap_or(params.conductor_length_m);
    let conductors = if item.phase.poles() == 3 { 3 } else { 2 };
    let required_ampacity_a = continuous_rating(item.current_a);

    let evaluated: Vec<(&ConductorSize, Economics)> = sizes
        .into_iter()
        .map(|s| (s, economics(s, item.current_a, length_m, conductors, params)))
        .collect();

    let optimal = evaluated
        .iter()
        .filter(|(_, e)| e.ampacity_a >= required_ampacity_a)
        .min_by(|(_, a), (_, b)| a.lifecycle_cost.total_cmp(&b.lifecycle_cost))
        .ok_or_else(|| {
            ElecError::calculation_failed(
                "economic sizing",
                format!(
                    "no candidate carries the required {:.1} A with {}",
                    required_ampacity_a,
                    params.material.display_name().to_lowercase()
                ),
            )
        })?;
    let optimal_size_mm2 = optimal.0.size_mm2;

    let current_size_mm2 = item.circuit.conductor_mm2;
    let baseline = match current_size_mm2 {
        Some(size_mm2) => {
            let size = lookup(size_mm2)?;
            (size, economics(size, item.current_a, length_m, conductors, params))
        }
        None => {
            let smallest = evaluated
                .iter()
                .find(|(_, e)| e.ampacity_a >= required_ampacity_a)
                .unwrap_or(optimal);
            (smallest.0, economics(smallest.0, item.current_a, length_m, conductors, params))
        }
    };
    let baseline_size_mm2 = baseline.0.size_mm2;

    let options: Vec<ConductorOption> = evaluated
        .iter()
        .map(|(size, e)| ConductorOption {
            size_mm2: size.size_mm2,
            ampacity_a: e.ampacity_a,
            sufficient_ampacity: e.ampacity_a >= required_ampacity_a,
            resistance_ohm_per_m: e.resistance_ohm_per_m,
            material_cost: e.material_cost,
            power_loss_w: e.power_loss_w,
            annual_energy_loss_kwh: e.annual_energy_loss_kwh,
            annual_loss_cost: e.annual_loss_cost,
            lifecycle_cost: e.lifecycle_cost,
            payback_years: payback_years(e, &baseline.1),
        })
        .collect();

    let annual_savings = baseline.1.annual_loss_cost - optimal.1.annual_loss_cost;
    let lifecycle_savings = baseline.1.lifecycle_cost - optimal.1.lifecycle_cost;

    let recommendation = match current_size_mm2 {
        Some(current) if (current - optimal_size_mm2).abs() < 1e-9 => {
            format!("Installed {} mm² conductor is already the lifecycle optimum", current)
        }
        Some(current) => {
            let payback = payback_years(&optimal.1, &baseline.1)
                .map(|y| format!("payback {:.1} years", y))
                .unwrap_or_else(|| "no payback".to_string());
            format!(
                "Change from {} mm² to {} mm²: saves {:.0} per year in losses, {:.0} over {} years ({})",
                current, optimal_size_mm2, annual_savings, lifecycle_savings, params.lifecycle_years, payback
            )
        }
        None => format!(
            "Install {} mm² conductor: lowest lifecycle cost {:.0} over {} years",
            optimal_size_mm2, optimal.1.lifecycle_cost, params.lifecycle_years
        ),
    };

    debug!(
        item = %item.id,
        candidates = options.len(),
        optimal = optimal_size_mm2,
        "conductor sizes compared"
    );

    Ok(ConductorComparison {
        item_id: item.id,
        description: item.description.clone(),
        current_a: item.current_a,
        required_ampacity_a,
        length_m,
        conductors,
        material: params.material,
        current_size_mm2,
        baseline_size_mm2,
        options,
        optimal_size_mm2,
        annual_savings,
        lifecycle_savings,
        recommendation,
    })
}

/// [`compare_conductor_sizes`] over every standard size.
pub fn compare_all_sizes(item: &LoadItem, params: &AnalysisParameters) -> ElecResult<ConductorComparison> {
    let sizes: Vec<f64> = STANDARD_SIZES.iter().map(|s| s.size_mm2).collect();
    compare_conductor_sizes(item, &sizes, params)
}
