//! # elec_core - Electrical Load Schedule Engine
//!
//! `elec_core` is the computational heart of Panelbook: panel load schedules,
//! derived electrical quantities, PEC 2017 compliance checks, three-phase
//! balance and economic conductor sizing. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure calculations**: analyses take a schedule and parameters and return results
//! - **Explicit recomputation**: schedule totals are rebuilt after every mutation
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use elec_core::calculations::{evaluate_compliance, AnalysisParameters};
//! use elec_core::schedule::{LoadItemInput, LoadSchedule, PhaseConfiguration};
//!
//! let mut panel = LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap();
//! panel.add_item(LoadItemInput::new("Lighting", 20, 18.0, 1.0)).unwrap();
//!
//! let result = evaluate_compliance(&panel, &AnalysisParameters::default()).unwrap();
//! assert!(result.compliant);
//! ```
//!
//! ## Modules
//!
//! - [`schedule`] - Load schedule container and load items
//! - [`calculations`] - Voltage drop, phase balance, compliance, economic sizing
//! - [`conductors`] - Conductor and breaker tables
//! - [`standards`] - PEC 2017 thresholds
//! - [`store`] - Saved-calculation key-value store
//! - [`config`] - TOML configuration
//! - [`errors`] - Structured error types
//! - [`file_io`] - Schedule files with atomic saves and locking

pub mod calculations;
pub mod conductors;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod schedule;
pub mod standards;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use calculations::AnalysisParameters;
pub use config::EngineConfig;
pub use errors::{ElecError, ElecResult};
pub use file_io::{load_schedule, save_schedule, FileLock};
pub use schedule::{LoadItem, LoadItemInput, LoadItemPatch, LoadSchedule};
pub use store::{CalculationStore, DirectoryStore, MemoryStore, SavedCalculation};
