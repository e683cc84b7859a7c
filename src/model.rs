use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One set of a workout. `weight` is always kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub reps: u32,
    pub weight: f64,
}

impl SetEntry {
    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight
    }
}

/// A committed exercise session on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: NaiveDate,
    pub exercise: String,
    pub sets: Vec<SetEntry>,
}

impl WorkoutRecord {
    /// Sum of `reps * weight` over all sets, in kilograms.
    pub fn total_volume(&self) -> f64 {
        self.sets.iter().map(SetEntry::volume).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_volume_sums_sets() {
        let rec = WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exercise: "Bench Press".into(),
            sets: vec![
                SetEntry { reps: 10, weight: 60.0 },
                SetEntry { reps: 8, weight: 65.0 },
            ],
        };
        assert!((rec.total_volume() - 1120.0).abs() < 1e-9);
    }

    #[test]
    fn date_serializes_as_iso() {
        let rec = WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            exercise: "Squat".into(),
            sets: vec![SetEntry { reps: 5, weight: 100.0 }],
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"date\":\"2024-03-09\""));
    }
}
