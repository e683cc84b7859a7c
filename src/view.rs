use crate::model::{SetEntry, WorkoutRecord};
use crate::units::WeightUnit;
use serde::Serialize;

/// One rendered row of the workout table, in the display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Position of the record in the log, used by the delete control.
    pub index: usize,
    pub date: String,
    pub exercise: String,
    pub sets: Vec<String>,
    pub total: f64,
    pub total_label: String,
}

pub fn describe_set(set: &SetEntry, unit: WeightUnit) -> String {
    format!("{} x {:.1} {}", set.reps, unit.display_rounded(set.weight), unit)
}

/// Derive the full table from the current records.
pub fn table_rows(records: &[WorkoutRecord], unit: WeightUnit) -> Vec<TableRow> {
    records
        .iter()
        .enumerate()
        .map(|(index, r)| {
            let total = unit.display_rounded(r.total_volume());
            TableRow {
                index,
                date: r.date.format("%Y-%m-%d").to_string(),
                exercise: r.exercise.clone(),
                sets: r.sets.iter().map(|s| describe_set(s, unit)).collect(),
                total,
                total_label: format!("{total:.1} {unit}"),
            }
        })
        .collect()
}

/// Distinct exercise names in the order they were first logged.
pub fn exercise_names(records: &[WorkoutRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for r in records {
        if !names.iter().any(|n| n == &r.exercise) {
            names.push(r.exercise.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: &str, exercise: &str, sets: &[(u32, f64)]) -> WorkoutRecord {
        WorkoutRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            exercise: exercise.into(),
            sets: sets
                .iter()
                .map(|&(reps, weight)| SetEntry { reps, weight })
                .collect(),
        }
    }

    #[test]
    fn bench_press_row_in_kg_and_lb() {
        let records = vec![record("2024-01-01", "Bench Press", &[(10, 60.0), (8, 65.0)])];

        let rows = table_rows(&records, WeightUnit::Kg);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[0].sets, vec!["10 x 60.0 kg", "8 x 65.0 kg"]);
        assert_eq!(rows[0].total_label, "1120.0 kg");

        let rows = table_rows(&records, WeightUnit::Lb);
        assert_eq!(rows[0].sets, vec!["10 x 132.3 lb", "8 x 143.3 lb"]);
        assert_eq!(rows[0].total, 2469.2);
        assert_eq!(rows[0].total_label, "2469.2 lb");
    }

    #[test]
    fn rows_follow_record_order_after_removal() {
        let mut records = vec![
            record("2024-01-03", "A", &[(5, 10.0)]),
            record("2024-01-01", "B", &[(5, 20.0)]),
            record("2024-01-02", "C", &[(5, 30.0)]),
        ];
        records.remove(1);
        let rows = table_rows(&records, WeightUnit::Kg);
        let names: Vec<_> = rows.iter().map(|r| r.exercise.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn exercise_names_are_unique_in_first_seen_order() {
        let records = vec![
            record("2024-01-01", "Squat", &[(5, 100.0)]),
            record("2024-01-02", "Bench", &[(5, 80.0)]),
            record("2024-01-03", "Squat", &[(5, 105.0)]),
        ];
        assert_eq!(exercise_names(&records), vec!["Squat", "Bench"]);
    }
}
