//! The workout log: committed records, staged sets and the display unit.

use crate::model::{SetEntry, WorkoutRecord};
use crate::storage::{
    CORRUPT_WORKOUTS_KEY, KvStore, StorageError, WORKOUTS_KEY, load_unit, load_workouts,
    save_unit, save_workouts,
};
use crate::units::WeightUnit;
use chrono::{Local, NaiveDate};

/// Rejected set input.
#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    InvalidReps(String),
    InvalidWeight(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::InvalidReps(v) => write!(f, "reps must be a positive whole number, got '{v}'"),
            StageError::InvalidWeight(v) => write!(f, "weight must be a number, got '{v}'"),
        }
    }
}

impl std::error::Error for StageError {}

#[derive(Debug)]
pub enum CommitError {
    EmptyExercise,
    NoPendingSets,
    Storage(StorageError),
}

impl std::fmt::Display for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::EmptyExercise => write!(f, "exercise name is empty"),
            CommitError::NoPendingSets => write!(f, "no sets staged"),
            CommitError::Storage(e) => write!(f, "workout not saved: {e}"),
        }
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommitError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for CommitError {
    fn from(e: StorageError) -> Self {
        CommitError::Storage(e)
    }
}

/// Parse the reps and weight text fields of the entry form.
pub fn parse_set_input(reps: &str, weight: &str) -> Result<(u32, f64), StageError> {
    let reps_val = reps
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|r| *r > 0)
        .ok_or_else(|| StageError::InvalidReps(reps.trim().to_string()))?;
    let weight_val = weight
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .ok_or_else(|| StageError::InvalidWeight(weight.trim().to_string()))?;
    Ok((reps_val, weight_val))
}

/// Owns the workout list and persists it through `S` after every mutation.
pub struct WorkoutStore<S: KvStore> {
    kv: S,
    records: Vec<WorkoutRecord>,
    pending: Vec<SetEntry>,
    unit: WeightUnit,
    last_date: NaiveDate,
    load_warning: Option<String>,
    /// Set when unreadable stored workouts could not be set aside; saving
    /// would overwrite them.
    writes_blocked: bool,
}

impl<S: KvStore> WorkoutStore<S> {
    /// Load the stored log, defaulting the entry date to today.
    pub fn open(kv: S) -> Self {
        Self::open_with_date(kv, Local::now().date_naive())
    }

    /// Load the stored log.
    ///
    /// Never fails: unreadable data starts an empty log and is reported via
    /// [`WorkoutStore::load_warning`]. The raw value is first copied to
    /// `workouts.corrupt` so the next save does not destroy it. If that copy
    /// fails, committing and deleting are refused for the session.
    pub fn open_with_date(mut kv: S, today: NaiveDate) -> Self {
        let mut load_warning = None;
        let mut writes_blocked = false;
        let records = match load_workouts(&kv) {
            Ok(records) => {
                log::info!("Loaded {} workouts", records.len());
                records
            }
            Err(e) => {
                log::warn!("{e}; starting with an empty log");
                match kv.copy_raw(WORKOUTS_KEY, CORRUPT_WORKOUTS_KEY) {
                    Ok(_) => {
                        load_warning = Some(format!(
                            "Stored workouts were unreadable and have been set aside as '{CORRUPT_WORKOUTS_KEY}'"
                        ));
                    }
                    Err(err) => {
                        log::error!("Failed to back up unreadable workouts: {err}");
                        writes_blocked = true;
                        load_warning = Some(format!(
                            "Could not read stored workouts ({e}); changes will not be saved"
                        ));
                    }
                }
                Vec::new()
            }
        };
        let unit = load_unit(&kv);
        Self {
            kv,
            records,
            pending: Vec::new(),
            unit,
            last_date: today,
            load_warning,
            writes_blocked,
        }
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn pending_sets(&self) -> &[SetEntry] {
        &self.pending
    }

    pub fn unit(&self) -> WeightUnit {
        self.unit
    }

    /// Date used when a workout is committed without one.
    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        if self.writes_blocked {
            return Err(StorageError::Unavailable(
                "stored workouts could not be read or backed up".to_string(),
            ));
        }
        save_workouts(&mut self.kv, &self.records)
    }

    /// Stage a set entered in the current display unit.
    pub fn add_pending_set(&mut self, reps: u32, display_weight: f64) -> Result<(), StageError> {
        if reps == 0 {
            return Err(StageError::InvalidReps(reps.to_string()));
        }
        if !display_weight.is_finite() {
            return Err(StageError::InvalidWeight(display_weight.to_string()));
        }
        self.pending.push(SetEntry {
            reps,
            weight: self.unit.from_display(display_weight),
        });
        Ok(())
    }

    pub fn remove_pending_set(&mut self, index: usize) -> Option<SetEntry> {
        if index < self.pending.len() {
            Some(self.pending.remove(index))
        } else {
            None
        }
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Commit the staged sets as a workout and return the new record count.
    ///
    /// On a storage failure the record is not kept and the staged sets stay
    /// in place.
    pub fn commit_workout(
        &mut self,
        date: Option<NaiveDate>,
        exercise: &str,
    ) -> Result<usize, CommitError> {
        let exercise = exercise.trim();
        if exercise.is_empty() {
            return Err(CommitError::EmptyExercise);
        }
        if self.pending.is_empty() {
            return Err(CommitError::NoPendingSets);
        }
        let date = date.unwrap_or(self.last_date);
        self.records.push(WorkoutRecord {
            date,
            exercise: exercise.to_string(),
            sets: self.pending.clone(),
        });
        if let Err(e) = self.persist() {
            self.records.pop();
            log::error!("Failed to save workout: {e}");
            return Err(e.into());
        }
        log::info!(
            "Committed {exercise} on {date} with {} sets",
            self.pending.len()
        );
        self.clear_pending();
        self.last_date = date;
        Ok(self.records.len())
    }

    /// Remove the record at `index`. Out-of-range indices change nothing.
    pub fn delete_workout(&mut self, index: usize) -> Result<Option<WorkoutRecord>, StorageError> {
        if index >= self.records.len() {
            return Ok(None);
        }
        let removed = self.records.remove(index);
        if let Err(e) = self.persist() {
            self.records.insert(index, removed);
            log::error!("Failed to save after delete: {e}");
            return Err(e);
        }
        log::info!("Deleted {} on {}", removed.exercise, removed.date);
        Ok(Some(removed))
    }

    /// Switch between kg and lb. Stored weights are untouched.
    pub fn toggle_unit(&mut self) -> Result<WeightUnit, StorageError> {
        self.set_unit(self.unit.toggled())?;
        Ok(self.unit)
    }

    pub fn set_unit(&mut self, unit: WeightUnit) -> Result<(), StorageError> {
        self.unit = unit;
        save_unit(&mut self.kv, unit)?;
        log::info!("Display unit set to {unit}");
        Ok(())
    }
}
