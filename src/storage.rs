//! String-keyed persistent storage for the workout log.

use crate::model::{SetEntry, WorkoutRecord};
use crate::units::WeightUnit;
use chrono::NaiveDate;
use dirs_next as dirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const WORKOUTS_KEY: &str = "workouts";
pub const UNIT_KEY: &str = "unitPreference";
/// Where an unreadable `workouts` value is preserved before it gets overwritten.
pub const CORRUPT_WORKOUTS_KEY: &str = "workouts.corrupt";

/// Largest repeat count accepted from a legacy `{ sets, reps, weight }` entry.
pub const MAX_LEGACY_SET_COUNT: u32 = 1000;

const DATA_DIR_ENV: &str = "WORKOUT_LOG_DIR";
const APP_DIR: &str = "workout_log";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    Encoding {
        key: String,
        source: std::string::FromUtf8Error,
    },
    Serialize(serde_json::Error),
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Corrupt { key, source } => {
                write!(f, "stored value for '{key}' is corrupt: {source}")
            }
            StorageError::Encoding { key, source } => {
                write!(f, "stored value for '{key}' is not valid UTF-8: {source}")
            }
            StorageError::Serialize(e) => write!(f, "failed to serialize: {e}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Corrupt { source, .. } => Some(source),
            StorageError::Encoding { source, .. } => Some(source),
            StorageError::Serialize(e) => Some(e),
            StorageError::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Minimal key-value capability the workout store persists through.
pub trait KvStore {
    /// Returns `None` if the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites any existing value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Copy the raw value of `key` to `backup_key`, whether or not it is
    /// readable as a string. Returns `Ok(false)` if `key` is absent.
    fn copy_raw(&mut self, key: &str, backup_key: &str) -> Result<bool, StorageError> {
        match self.get(key)? {
            Some(raw) => self.set(backup_key, &raw).map(|_| true),
            None => Ok(false),
        }
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn copy_raw(&mut self, key: &str, backup_key: &str) -> Result<bool, StorageError> {
        (**self).copy_raw(key, backup_key)
    }
}

/// In-memory store used in tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Make every subsequent `set` fail, simulating a full or read-only disk.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable(format!("write to '{key}' rejected")));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|source| StorageError::Encoding {
                    key: key.to_string(),
                    source,
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn copy_raw(&mut self, key: &str, backup_key: &str) -> Result<bool, StorageError> {
        let src = self.path_for(key);
        if !src.exists() {
            return Ok(false);
        }
        std::fs::copy(&src, self.path_for(backup_key))?;
        Ok(true)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Resolve the directory workout data lives in.
///
/// `WORKOUT_LOG_DIR` wins over the configured directory, which wins over the
/// platform data directory.
pub fn resolve_data_dir(configured: Option<&Path>) -> Option<PathBuf> {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| configured.map(Path::to_path_buf))
        .or_else(|| dirs::data_dir().map(|p| p.join(APP_DIR)))
}

// Sets may come from the older single-set tracker, which stored
// `{ sets, reps, weight }` with `sets` identical sets per entry.
#[derive(Deserialize)]
struct StoredSet {
    #[serde(default)]
    sets: Option<u32>,
    reps: u32,
    weight: f64,
}

#[derive(Deserialize)]
struct StoredRecord {
    date: NaiveDate,
    exercise: String,
    sets: Vec<StoredSet>,
}

impl StoredRecord {
    fn into_record(self) -> Result<WorkoutRecord, String> {
        let mut sets = Vec::with_capacity(self.sets.len());
        for s in self.sets {
            if s.reps == 0 || !s.weight.is_finite() {
                continue;
            }
            let copies = s.sets.unwrap_or(1);
            if copies > MAX_LEGACY_SET_COUNT {
                return Err(format!(
                    "{} on {} repeats a set {copies} times (limit {MAX_LEGACY_SET_COUNT})",
                    self.exercise, self.date
                ));
            }
            for _ in 0..copies {
                sets.push(SetEntry {
                    reps: s.reps,
                    weight: s.weight,
                });
            }
        }
        Ok(WorkoutRecord {
            date: self.date,
            exercise: self.exercise,
            sets,
        })
    }
}

/// Parse a serialized workout list, expanding legacy set entries.
///
/// Records left without any sets are dropped. A repeat count above
/// [`MAX_LEGACY_SET_COUNT`] makes the whole value invalid.
pub fn parse_workouts(data: &str) -> Result<Vec<WorkoutRecord>, serde_json::Error> {
    let stored: Vec<StoredRecord> = serde_json::from_str(data)?;
    let total = stored.len();
    let mut records = Vec::with_capacity(total);
    for s in stored {
        let record = s
            .into_record()
            .map_err(<serde_json::Error as serde::de::Error>::custom)?;
        if !record.sets.is_empty() {
            records.push(record);
        }
    }
    if records.len() != total {
        log::warn!(
            "Dropped {} stored workouts without valid sets",
            total - records.len()
        );
    }
    Ok(records)
}

pub fn load_workouts(store: &dyn KvStore) -> Result<Vec<WorkoutRecord>, StorageError> {
    match store.get(WORKOUTS_KEY)? {
        None => Ok(Vec::new()),
        Some(data) if data.trim().is_empty() || data.trim() == "null" => Ok(Vec::new()),
        Some(data) => parse_workouts(&data).map_err(|source| StorageError::Corrupt {
            key: WORKOUTS_KEY.to_string(),
            source,
        }),
    }
}

pub fn save_workouts(store: &mut dyn KvStore, records: &[WorkoutRecord]) -> Result<(), StorageError> {
    let data = serde_json::to_string(records).map_err(StorageError::Serialize)?;
    store.set(WORKOUTS_KEY, &data)
}

/// Missing, unreadable or unknown preferences fall back to kilograms.
pub fn load_unit(store: &dyn KvStore) -> WeightUnit {
    match store.get(UNIT_KEY) {
        Ok(Some(s)) => WeightUnit::from_label(&s).unwrap_or_else(|| {
            log::warn!("Unknown unit preference '{s}', using kg");
            WeightUnit::Kg
        }),
        Ok(None) => WeightUnit::Kg,
        Err(e) => {
            log::warn!("Failed to read unit preference: {e}");
            WeightUnit::Kg
        }
    }
}

pub fn save_unit(store: &mut dyn KvStore, unit: WeightUnit) -> Result<(), StorageError> {
    store.set(UNIT_KEY, unit.label())
}
