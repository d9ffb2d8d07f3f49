//! Plain-text rendering of engine results.

use elec_core::calculations::voltage_drop::VoltageDropResult;
use elec_core::calculations::{ComplianceResult, ConductorComparison, PhaseBalanceResult};
use elec_core::conductors::CircuitRecommendation;
use elec_core::schedule::{LoadSchedule, Phase};
use elec_core::store::CalculationSummary;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

fn status_icon(pass: bool) -> &'static str {
    if pass {
        "[OK]"
    } else {
        "[FAIL]"
    }
}

fn banner(title: &str) {
    println!("{}", RULE);
    println!("  {}", title);
    println!("{}", RULE);
}

pub fn print_schedule(schedule: &LoadSchedule) {
    banner(&format!(
        "PANEL {} ({:.0} V, {}, pf {:.2})",
        schedule.panel_name,
        schedule.system_voltage(),
        schedule.phase_configuration.display_name(),
        schedule.power_factor()
    ));
    println!(
        "{:>3}  {:<28} {:>4} {:>8} {:>5} {:>10} {:>10} {:>8} {:>4}",
        "#", "Description", "Qty", "W/unit", "DF", "Conn. W", "Demand W", "A", "Ph"
    );
    for (i, item) in schedule.items().iter().enumerate() {
        println!(
            "{:>3}  {:<28} {:>4} {:>8.0} {:>5.2} {:>10.0} {:>10.0} {:>8.2} {:>4}",
            i + 1,
            truncate(&item.description, 28),
            item.quantity,
            item.rating_w,
            item.demand_factor,
            item.connected_load_w,
            item.demand_load_w,
            item.current_a,
            format!("{:?}", item.phase)
        );
    }
    let totals = schedule.totals();
    println!();
    println!("  Connected load: {:>10.0} W", totals.connected_load_w);
    println!("  Demand load:    {:>10.0} W", totals.demand_load_w);
    println!("  Current:        {:>10.2} A", totals.current_a);
    println!("  Apparent power: {:>10.0} VA", totals.volt_ampere);
}

pub fn print_compliance(result: &ComplianceResult) {
    println!();
    banner(&format!("{} COMPLIANCE", result.code_edition));
    for item in &result.items {
        let vd = item
            .voltage_drop_percent
            .map(|v| format!("VD {:.2}%", v))
            .unwrap_or_else(|| "VD n/a".to_string());
        println!("  {:<6} {:<28} {:>10}", status_icon(item.compliant), truncate(&item.description, 28), vd);
        for issue in &item.issues {
            println!("           - {}", issue);
        }
        for rec in &item.recommendations {
            println!("           > {}", rec);
        }
    }
    if let Some(vd) = result.feeder_voltage_drop_percent {
        println!("  Feeder voltage drop: {:.2}% ({:.1} A)", vd, result.feeder_current_a);
    }
    if let Some(vd) = result.total_voltage_drop_percent {
        println!("  Worst total voltage drop: {:.2}%", vd);
    }
    if let Some(imbalance) = result.phase_imbalance_percent {
        println!("  Phase imbalance: {:.1}%", imbalance);
    }
    let failing: Vec<&str> = result.failing_items().map(|i| i.description.as_str()).collect();
    if !failing.is_empty() {
        println!("  Failing items: {}", failing.join(", "));
    }
    for issue in &result.issues {
        println!("  - {}", issue);
    }
    for rec in &result.recommendations {
        println!("  > {}", rec);
    }
    println!();
    banner(&format!(
        "RESULT: {} ({} issue(s))",
        if result.compliant { "COMPLIANT" } else { "NON-COMPLIANT" },
        result.issue_count()
    ));
}

pub fn print_balance(result: &PhaseBalanceResult) {
    banner("PHASE BALANCE");
    for phase in Phase::ALL {
        println!("  Phase {}: {:>8.2} A", phase, result.phase_current(phase));
    }
    println!("  Average: {:>8.2} A", result.average_a);
    println!(
        "  Imbalance: {:.1}% {}",
        result.imbalance_percent,
        status_icon(result.is_balanced)
    );
    if let Some(rec) = &result.recommendation {
        println!("  > {}", rec);
    }
}

pub fn print_comparison(result: &ConductorComparison) {
    banner(&format!(
        "CONDUCTOR SIZING: {} ({:.2} A, {:.0} m, {} × {})",
        result.description, result.current_a, result.length_m, result.conductors, result.material
    ));
    println!(
        "  {:>7} {:>8} {:>11} {:>9} {:>12} {:>13} {:>9}",
        "mm²", "Amp. A", "Material", "Loss W", "Loss/yr", "Lifecycle", "Payback"
    );
    for option in &result.options {
        let marker = if (option.size_mm2 - result.optimal_size_mm2).abs() < 1e-9 {
            "*"
        } else if option.sufficient_ampacity {
            " "
        } else {
            "x"
        };
        let payback = option
            .payback_years
            .map(|y| format!("{:.1} y", y))
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{} {:>7} {:>8.1} {:>11.0} {:>9.1} {:>12.0} {:>13.0} {:>9}",
            marker,
            option.size_mm2,
            option.ampacity_a,
            option.material_cost,
            option.power_loss_w,
            option.annual_loss_cost,
            option.lifecycle_cost,
            payback
        );
    }
    println!();
    println!("  Required ampacity: {:.1} A (x = insufficient, * = optimal)", result.required_ampacity_a);
    println!("  > {}", result.recommendation);
}

pub fn print_voltage_drop(result: &VoltageDropResult) {
    banner("VOLTAGE DROP");
    println!("  R:          {:.6} Ω/m", result.resistance_ohm_per_m);
    println!("  Factor k:   {:.3}", result.drop_factor);
    println!("  Drop:       {:.2} V", result.drop_v);
    println!("  Receiving:  {:.1} V", result.receiving_voltage);
    println!(
        "  Drop:       {:.2}% (limit {:.1}%) {}",
        result.drop_percent,
        result.limit_percent,
        status_icon(result.passes())
    );
}

pub fn print_recommendation(rec: &CircuitRecommendation) {
    banner("CIRCUIT RECOMMENDATION");
    println!("  Load current:   {:.2} A", rec.current_a);
    println!("  Design current: {:.2} A (125%)", rec.design_current_a);
    println!("  Breaker:        {:.0} A", rec.breaker_a);
    println!(
        "  Conductor:      {} mm² {} ({:.1} A)",
        rec.conductor_mm2, rec.material, rec.conductor_ampacity_a
    );
}

pub fn print_saved_list(summaries: &[CalculationSummary]) {
    if summaries.is_empty() {
        println!("No saved calculations.");
        return;
    }
    for s in summaries {
        println!(
            "{}  {:<18} {}  {}",
            s.id,
            s.kind.display_name(),
            s.updated_at.format("%Y-%m-%d %H:%M"),
            s.name
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
