//! TOML-based engine configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! ```toml
//! [analysis]
//! conductor_length_m = 25.0
//! material = "copper"
//! electricity_rate_per_kwh = 12.5
//!
//! [defaults]
//! system_voltage = 230.0
//! power_factor = 0.85
//! phase = "single_phase"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::AnalysisParameters;
use crate::errors::{ElecError, ElecResult};
use crate::schedule::{LoadSchedule, PhaseConfiguration};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Site and economic parameters for the analyses.
    #[serde(default)]
    pub analysis: AnalysisParameters,
    /// Supply parameters for newly created schedules.
    #[serde(default)]
    pub defaults: ScheduleDefaults,
}

/// Supply parameters for new schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleDefaults {
    pub system_voltage: f64,
    pub power_factor: f64,
    pub phase: PhaseConfiguration,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        ScheduleDefaults {
            system_voltage: 230.0,
            power_factor: 0.85,
            phase: PhaseConfiguration::SinglePhase,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml_str(s: &str) -> ElecResult<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(ElecError::serialization)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn from_toml_file(path: &Path) -> ElecResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ElecError::file_error("read config", path.display().to_string(), e.to_string()))?;
        debug!(path = %path.display(), "loaded engine config");
        Self::from_toml_str(&content)
    }

    /// Like [`EngineConfig::from_toml_file`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> ElecResult<Self> {
        if path.exists() {
            Self::from_toml_file(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(EngineConfig::default())
        }
    }

    pub fn validate(&self) -> ElecResult<()> {
        self.analysis.validate()?;
        // Reuses the schedule's own supply validation.
        self.new_schedule("validation").map(|_| ())
    }

    /// Empty schedule using the configured supply defaults.
    pub fn new_schedule(&self, panel_name: impl Into<String>) -> ElecResult<LoadSchedule> {
        LoadSchedule::new(
            panel_name,
            self.defaults.system_voltage,
            self.defaults.power_factor,
            self.defaults.phase,
        )
    }
}
