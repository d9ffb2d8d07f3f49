//! # Saved Calculations
//!
//! Key-value storage for calculation snapshots. The payload is opaque JSON:
//! the store never interprets it, callers encode with
//! [`SavedCalculation::from_value`] and decode with [`SavedCalculation::decode`].
//!
//! Two backends:
//!
//! - [`MemoryStore`] - in-process map (tests, embedding)
//! - [`DirectoryStore`] - one `<uuid>.json` file per record
//!
//! ## Example
//!
//! ```rust
//! use elec_core::store::{CalculationKind, CalculationStore, MemoryStore, SavedCalculation};
//! use elec_core::schedule::{LoadSchedule, PhaseConfiguration};
//!
//! let schedule = LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap();
//! let record = SavedCalculation::from_value("LP-1 draft", CalculationKind::LoadSchedule, &schedule).unwrap();
//!
//! let mut store = MemoryStore::new();
//! let id = store.put(record).unwrap();
//! let restored: LoadSchedule = store.get(&id).unwrap().decode().unwrap();
//! assert_eq!(restored.panel_name, "LP-1");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ElecError, ElecResult};
use crate::file_io::write_atomic;

/// What a saved payload contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    LoadSchedule,
    VoltageDrop,
    PhaseBalance,
    ConductorSizing,
    Compliance,
}

impl CalculationKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationKind::LoadSchedule => "Load schedule",
            CalculationKind::VoltageDrop => "Voltage drop",
            CalculationKind::PhaseBalance => "Phase balance",
            CalculationKind::ConductorSizing => "Conductor sizing",
            CalculationKind::Compliance => "Compliance",
        }
    }
}

/// One stored calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCalculation {
    pub id: Uuid,
    pub name: String,
    pub kind: CalculationKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedCalculation {
    pub fn new(name: impl Into<String>, kind: CalculationKind, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        SavedCalculation {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            payload,
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialize any value as the payload.
    pub fn from_value<T: Serialize>(name: impl Into<String>, kind: CalculationKind, value: &T) -> ElecResult<Self> {
        let payload = serde_json::to_value(value).map_err(ElecError::serialization)?;
        Ok(SavedCalculation::new(name, kind, payload))
    }

    /// Deserialize the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> ElecResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(ElecError::serialization)
    }

    pub fn summary(&self) -> CalculationSummary {
        CalculationSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry without the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub id: Uuid,
    pub name: String,
    pub kind: CalculationKind,
    pub updated_at: DateTime<Utc>,
}

/// Key-value store for saved calculations.
pub trait CalculationStore {
    /// Insert or overwrite by `record.id`. Overwriting keeps the original
    /// `created_at` and refreshes `updated_at`.
    fn put(&mut self, record: SavedCalculation) -> ElecResult<Uuid>;

    fn get(&self, id: &Uuid) -> ElecResult<SavedCalculation>;

    /// Summaries, most recently updated first.
    fn list(&self) -> ElecResult<Vec<CalculationSummary>>;

    /// Returns whether a record was removed.
    fn delete(&mut self, id: &Uuid) -> ElecResult<bool>;
}

fn validate_record(record: &SavedCalculation) -> ElecResult<()> {
    if record.name.trim().is_empty() {
        return Err(ElecError::missing_field("name"));
    }
    Ok(())
}

fn sort_newest_first(summaries: &mut [CalculationSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.name.cmp(&b.name)));
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<Uuid, SavedCalculation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CalculationStore for MemoryStore {
    fn put(&mut self, mut record: SavedCalculation) -> ElecResult<Uuid> {
        validate_record(&record)?;
        if let Some(existing) = self.records.get(&record.id) {
            record.created_at = existing.created_at;
            record.updated_at = Utc::now();
        }
        let id = record.id;
        self.records.insert(id, record);
        Ok(id)
    }

    fn get(&self, id: &Uuid) -> ElecResult<SavedCalculation> {
        self.records.get(id).cloned().ok_or(ElecError::NotFound { id: *id })
    }

    fn list(&self) -> ElecResult<Vec<CalculationSummary>> {
        let mut summaries: Vec<_> = self.records.values().map(SavedCalculation::summary).collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    fn delete(&mut self, id: &Uuid) -> ElecResult<bool> {
        Ok(self.records.remove(id).is_some())
    }
}

/// Directory-backed store: `<dir>/<uuid>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Open (creating if needed) a store directory.
    pub fn open(dir: impl Into<PathBuf>) -> ElecResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| ElecError::file_error("create store directory", dir.display().to_string(), e.to_string()))?;
        Ok(DirectoryStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(&self, path: &Path) -> ElecResult<SavedCalculation> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ElecError::file_error("read", path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&contents).map_err(ElecError::serialization)
    }
}

impl CalculationStore for DirectoryStore {
    fn put(&mut self, mut record: SavedCalculation) -> ElecResult<Uuid> {
        validate_record(&record)?;
        let path = self.record_path(&record.id);
        if path.exists() {
            let existing = self.read(&path)?;
            record.created_at = existing.created_at;
            record.updated_at = Utc::now();
        }
        let json = serde_json::to_string_pretty(&record).map_err(ElecError::serialization)?;
        write_atomic(&path, json.as_bytes())?;
        debug!(id = %record.id, kind = ?record.kind, "saved calculation");
        Ok(record.id)
    }

    fn get(&self, id: &Uuid) -> ElecResult<SavedCalculation> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(ElecError::NotFound { id: *id });
        }
        self.read(&path)
    }

    fn list(&self) -> ElecResult<Vec<CalculationSummary>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| ElecError::file_error("list", self.dir.display().to_string(), e.to_string()))?;

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable saved calculation"),
            }
        }
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    fn delete(&mut self, id: &Uuid) -> ElecResult<bool> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .map_err(|e| ElecError::file_error("delete", path.display().to_string(), e.to_string()))?;
        debug!(%id, "deleted saved calculation");
        Ok(true)
    }
}
