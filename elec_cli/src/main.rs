//! # Panelbook CLI
//!
//! Terminal front end for `elec_core`: create and edit schedule files, run
//! compliance/phase-balance/sizing analyses, and manage saved calculations.

mod cli;
mod logging;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use cli::{Cli, Commands, SavedCommands};
use elec_core::calculations::economic_sizing::compare_all_sizes;
use elec_core::calculations::voltage_drop::{self, VoltageDropInput};
use elec_core::calculations::{
    compare_conductor_sizes, compute_phase_balance, evaluate_compliance, AnalysisParameters, ComplianceResult,
};
use elec_core::conductors::{recommend_circuit, ConductorMaterial};
use elec_core::file_io::{load_schedule_with_lock_check, SCHEDULE_EXTENSION};
use elec_core::schedule::{CircuitInfo, LoadItem, LoadItemInput, PhaseConfiguration};
use elec_core::store::{CalculationKind, CalculationStore, DirectoryStore, SavedCalculation};
use elec_core::{load_schedule, save_schedule, ElecError, EngineConfig, FileLock, LoadSchedule};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        if let Some(engine_err) = err.downcast_ref::<ElecError>() {
            if engine_err.is_recoverable() {
                eprintln!("The file is in use; try again once it is closed.");
            }
            if let Ok(json) = serde_json::to_string_pretty(engine_err) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let params = &config.analysis;
    debug!(?params, "analysis parameters");

    match &cli.command {
        Commands::New {
            path,
            panel,
            voltage,
            system,
        } => {
            let path = schedule_file_path(path);
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            let mut schedule = config.new_schedule(panel.as_str())?;
            if let Some(voltage) = voltage {
                schedule.set_system_voltage(*voltage)?;
            }
            if let Some(system) = system {
                schedule.phase_configuration = PhaseConfiguration::from_str_flexible(system)?;
            }
            save_schedule(&schedule, &path)?;
            println!("Created {} for panel {}", path.display(), schedule.panel_name);
        }
        Commands::Add {
            path,
            description,
            quantity,
            rating,
            demand_factor,
            phase,
            breaker,
            conductor,
            length,
            user,
        } => {
            let input = LoadItemInput::new(description.as_str(), *quantity, *rating, *demand_factor)
                .with_phase((*phase).into())
                .with_circuit(CircuitInfo {
                    breaker_a: *breaker,
                    conductor_mm2: *conductor,
                    wire_type: None,
                    length_m: *length,
                });
            let id = edit_schedule(path, user, |schedule| schedule.add_item(input))?;
            println!("Added item {}", id);
        }
        Commands::Remove { path, item, user } => {
            let removed = edit_schedule(path, user, |schedule| {
                let id = resolve_item(schedule, item)?.id;
                Ok(schedule.remove_item(&id))
            })?;
            if let Some(removed) = removed {
                println!("Removed {} ({})", removed.description, removed.id);
            }
        }
        Commands::Analyze { path, write } => {
            let (schedule, result) = analyze(path, params, *write)?;
            if cli.json {
                print_json(&result)?;
            } else {
                report::print_schedule(&schedule);
                report::print_compliance(&result);
            }
        }
        Commands::Balance { path } => {
            let schedule = load_schedule(path)?;
            let result = compute_phase_balance(&schedule)?;
            if cli.json {
                print_json(&result)?;
            } else {
                report::print_balance(&result);
            }
        }
        Commands::Size { path, item, sizes } => {
            let schedule = load_schedule(path)?;
            let item = resolve_item(&schedule, item)?;
            let result = if sizes.is_empty() {
                compare_all_sizes(item, params)?
            } else {
                compare_conductor_sizes(item, sizes, params)?
            };
            if cli.json {
                print_json(&result)?;
            } else {
                report::print_comparison(&result);
            }
        }
        Commands::Vdrop {
            current,
            length,
            size,
            voltage,
            three_phase,
            poles,
            limit,
            material,
        } => {
            let input = VoltageDropInput {
                current_a: *current,
                length_m: *length,
                conductor_mm2: *size,
                material: material_or(material.as_deref(), params.material)?,
                system_voltage: *voltage,
                phase_configuration: if *three_phase {
                    PhaseConfiguration::ThreePhase
                } else {
                    PhaseConfiguration::SinglePhase
                },
                poles: *poles,
                temperature_c: params.temperature_c,
            };
            let result = voltage_drop::calculate(&input, *limit)?;
            if cli.json {
                print_json(&result)?;
            } else {
                report::print_voltage_drop(&result);
            }
        }
        Commands::Recommend { current, material } => {
            let material = material_or(material.as_deref(), params.material)?;
            let rec = recommend_circuit(*current, material, params.ambient_temperature_c)?;
            if cli.json {
                print_json(&rec)?;
            } else {
                report::print_recommendation(&rec);
            }
        }
        Commands::Saved { store, command } => run_saved(cli, store, command)?,
    }
    Ok(())
}

fn run_saved(cli: &Cli, dir: &Path, command: &SavedCommands) -> anyhow::Result<()> {
    let mut store = DirectoryStore::open(dir)?;
    match command {
        SavedCommands::List => {
            let summaries = store.list()?;
            if cli.json {
                print_json(&summaries)?;
            } else {
                report::print_saved_list(&summaries);
            }
        }
        SavedCommands::Show { id } => {
            let record = store.get(&parse_id(id)?)?;
            print_json(&record)?;
        }
        SavedCommands::Delete { id } => {
            let id = parse_id(id)?;
            if store.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("No saved calculation {}", id);
            }
        }
        SavedCommands::Put { path, name } => {
            let schedule = load_schedule(path)?;
            let record = SavedCalculation::from_value(name.as_str(), CalculationKind::LoadSchedule, &schedule)?;
            let id = store.put(record)?;
            println!("Saved {} as {}", path.display(), id);
        }
    }
    Ok(())
}

/// Load, mutate and save a schedule file under its lock.
fn edit_schedule<T>(
    path: &Path,
    user: &str,
    edit: impl FnOnce(&mut LoadSchedule) -> Result<T, ElecError>,
) -> anyhow::Result<T> {
    let _lock = FileLock::acquire(path, user)?;
    let mut schedule = load_schedule(path)?;
    let out = edit(&mut schedule)?;
    save_schedule(&schedule, path)?;
    Ok(out)
}

/// Evaluate a schedule file; with `write`, store the results under the file lock.
fn analyze(path: &Path, params: &AnalysisParameters, write: bool) -> anyhow::Result<(LoadSchedule, ComplianceResult)> {
    if write {
        return edit_schedule(path, "elec-cli", |schedule| {
            let result = evaluate_compliance(schedule, params)?;
            schedule.apply_compliance(&result);
            Ok((schedule.clone(), result))
        });
    }
    let (schedule, lock) = load_schedule_with_lock_check(path)?;
    if let Some(lock) = &lock {
        warn!(user = %lock.user_id, machine = %lock.machine, "schedule is open elsewhere");
    }
    let result = evaluate_compliance(&schedule, params)?;
    Ok((schedule, result))
}

/// Append the schedule extension when the path has none.
fn schedule_file_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(SCHEDULE_EXTENSION)
    }
}

fn material_or(arg: Option<&str>, default: ConductorMaterial) -> Result<ConductorMaterial, ElecError> {
    arg.map_or(Ok(default), ConductorMaterial::from_str_flexible)
}

/// Accept a UUID or a 1-based position in the schedule.
fn resolve_item<'a>(schedule: &'a LoadSchedule, key: &str) -> Result<&'a LoadItem, ElecError> {
    if let Ok(id) = Uuid::parse_str(key) {
        return schedule.get_item(&id).ok_or(ElecError::ItemNotFound { id });
    }
    key.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| schedule.items().get(i))
        .ok_or_else(|| ElecError::invalid_input("item", key, "Expected an item UUID or 1-based position"))
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("'{}' is not a valid id", id))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
