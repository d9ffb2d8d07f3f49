//! # File I/O Module
//!
//! Handles schedule file operations with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: Prevent concurrent edits on shared drives
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! Schedules are saved as `.lsch` files containing pretty-printed JSON.
//! Lock files use `.lsch.lock` extension with metadata about who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use elec_core::file_io::{save_schedule, load_schedule, FileLock};
//! use elec_core::schedule::{LoadSchedule, PhaseConfiguration};
//! use std::path::Path;
//!
//! let schedule = LoadSchedule::new("LP-1", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap();
//! let path = Path::new("lp-1.lsch");
//!
//! let lock = FileLock::acquire(path, "auditor@company.com").unwrap();
//! save_schedule(&schedule, path).unwrap();
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ElecError, ElecResult};
use crate::schedule::{LoadSchedule, SCHEMA_VERSION};

/// File extension for schedule files
pub const SCHEDULE_EXTENSION: &str = "lsch";

/// Lock file metadata stored in .lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Combines an OS-level lock (fs2) with a `.lock` metadata file so other
/// users can see who has the schedule open.
pub struct FileLock {
    schedule_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a schedule file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(ElecError::FileLocked)` - Another process holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> ElecResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = FileLock::check(path) {
            return Err(ElecError::file_locked(
                path.display().to_string(),
                format!("{} ({})", existing.user_id, existing.machine),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| ElecError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            ElecError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(ElecError::serialization)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| ElecError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "acquired schedule lock");
        Ok(FileLock {
            schedule_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if locked, `None` if available. Stale locks
    /// count as available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        match read_lock_info(&lock_path) {
            Ok(info) if !is_lock_stale(&info) => Some(info),
            Ok(info) => {
                warn!(path = %path.display(), user = %info.user_id, "ignoring stale schedule lock");
                None
            }
            Err(_) => None,
        }
    }

    pub fn schedule_path(&self) -> &Path {
        &self.schedule_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    with_suffix(path, "lock")
}

/// `name.ext` → `name.ext.suffix` (or `name.suffix` without extension)
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    path.with_extension(extension)
}

fn read_lock_info(lock_path: &Path) -> ElecResult<LockInfo> {
    let contents = fs::read_to_string(lock_path)
        .map_err(|e| ElecError::file_error("read lock", lock_path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&contents).map_err(ElecError::serialization)
}

/// A lock is stale when its process is gone (same machine) or it is over 24 h old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
        }
    }

    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Write bytes to `path` via a synced temp file and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> ElecResult<()> {
    let tmp_path = with_suffix(path, "tmp");

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| ElecError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(bytes)
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| ElecError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ElecError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// Save a schedule with atomic write semantics.
pub fn save_schedule(schedule: &LoadSchedule, path: &Path) -> ElecResult<()> {
    let json = serde_json::to_string_pretty(schedule).map_err(ElecError::serialization)?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), items = schedule.items().len(), "saved schedule");
    Ok(())
}

/// Load a schedule, validating its version and rebuilding derived values.
///
/// # Returns
///
/// * `Err(ElecError::VersionMismatch)` - File version is incompatible
/// * `Err(ElecError::SerializationError)` - Invalid JSON
/// * `Err(ElecError::FileError)` - I/O error
pub fn load_schedule(path: &Path) -> ElecResult<LoadSchedule> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ElecError::file_error("read", path.display().to_string(), e.to_string()))?;

    let version = serde_json::from_str::<serde_json::Value>(&contents)
        .map_err(|e| ElecError::serialization(format!("Invalid JSON in {}: {}", path.display(), e)))?
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ElecError::missing_field("version"))?;
    validate_version(&version)?;

    LoadSchedule::from_json(&contents)
}

/// Load a schedule, also reporting whether someone else holds its lock.
pub fn load_schedule_with_lock_check(path: &Path) -> ElecResult<(LoadSchedule, Option<LockInfo>)> {
    let schedule = load_schedule(path)?;
    let lock_info = FileLock::check(path);
    Ok((schedule, lock_info))
}

/// Major must match; for 0.x schemas a newer minor is rejected too.
fn validate_version(file_version: &str) -> ElecResult<()> {
    let mismatch = || ElecError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };

    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);
    if file_parts.is_empty() || current_parts.is_empty() || file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{LoadItemInput, PhaseConfiguration};

    fn sample_schedule() -> LoadSchedule {
        let mut schedule = LoadSchedule::new("LP-2", 230.0, 0.85, PhaseConfiguration::SinglePhase).unwrap();
        schedule.add_item(LoadItemInput::new("Lights", 12, 18.0, 1.0)).unwrap();
        schedule.add_item(LoadItemInput::new("Receptacles", 8, 180.0, 0.5)).unwrap();
        schedule
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/path/to/panel.lsch"));
        assert_eq!(lock_path, Path::new("/path/to/panel.lsch.lock"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp-2.lsch");
        let schedule = sample_schedule();
        save_schedule(&schedule, &path).unwrap();

        let loaded = load_schedule(&path).unwrap();
        assert_eq!(loaded.panel_name, "LP-2");
        assert_eq!(loaded.items().len(), 2);
        assert_eq!(loaded.items()[0].id, schedule.items()[0].id);
        assert_eq!(loaded.totals(), schedule.totals());
    }

    #[test]
    fn test_compliance_results_survive_reload() {
        use crate::calculations::{evaluate_compliance, AnalysisParameters};
        use crate::schedule::CircuitInfo;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp-3.lsch");
        let mut schedule = sample_schedule();
        schedule
            .add_item(LoadItemInput::new("Heater", 1, 2300.0, 1.0).with_circuit(CircuitInfo {
                breaker_a: Some(20.0),
                conductor_mm2: Some(2.0),
                wire_type: None,
                length_m: Some(60.0),
            }))
            .unwrap();
        let result = evaluate_compliance(&schedule, &AnalysisParameters::default()).unwrap();
        schedule.apply_compliance(&result);
        let heater = schedule.items()[2].clone();
        assert_eq!(heater.compliant, Some(false));
        assert!(heater.voltage_drop_percent.unwrap() > 3.0);

        save_schedule(&schedule, &path).unwrap();
        let loaded = load_schedule(&path).unwrap();

        assert_eq!(loaded.compliant, Some(false));
        assert_eq!(loaded.items()[2].compliant, Some(false));
        assert_eq!(loaded.items()[2].voltage_drop_percent, heater.voltage_drop_percent);
        assert_eq!(loaded.totals(), schedule.totals());
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp-2.lsch");
        save_schedule(&sample_schedule(), &path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("lp-2.lsch.tmp").exists());
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.lsch");
        let mut value = serde_json::to_value(sample_schedule()).unwrap();
        value["version"] = serde_json::json!("0.9.0");
        fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(load_schedule(&path), Err(ElecError::VersionMismatch { .. })));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.lsch");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_schedule(&path), Err(ElecError::SerializationError { .. })));
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.lsch");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "auditor@example.com").unwrap();
        assert_eq!(lock.info.user_id, "auditor@example.com");
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        assert!(FileLock::check(&path).is_some());
        let second = FileLock::acquire(&path, "other@example.com");
        assert!(matches!(second, Err(ElecError::FileLocked { .. })));

        drop(lock);
        assert!(!lock_path.exists());
        assert!(FileLock::check(&path).is_none());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
