use crate::{model::WorkoutRecord, view::TableRow};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Back up the canonical (kilogram) record list.
pub fn save_records_json<P: AsRef<Path>>(path: P, records: &[WorkoutRecord]) -> std::io::Result<()> {
    write_json(records, path)
}

/// Write the table as shown, one line per workout.
pub fn save_table_csv(writer: impl Write, rows: &[TableRow]) -> csv::Result<()> {
    #[derive(Serialize)]
    struct Row<'a> {
        date: &'a str,
        exercise: &'a str,
        sets: String,
        total: &'a str,
    }
    let mut wtr = csv::Writer::from_writer(writer);
    for r in rows {
        wtr.serialize(Row {
            date: &r.date,
            exercise: &r.exercise,
            sets: r.sets.join("; "),
            total: &r.total_label,
        })?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_table_csv_file<P: AsRef<Path>>(path: P, rows: &[TableRow]) -> csv::Result<()> {
    save_table_csv(std::fs::File::create(path)?, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SetEntry;
    use crate::units::WeightUnit;
    use crate::view::table_rows;
    use chrono::NaiveDate;

    fn records() -> Vec<WorkoutRecord> {
        vec![WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exercise: "Bench Press".into(),
            sets: vec![
                SetEntry { reps: 10, weight: 60.0 },
                SetEntry { reps: 8, weight: 65.0 },
            ],
        }]
    }

    #[test]
    fn table_csv_uses_display_unit() {
        let rows = table_rows(&records(), WeightUnit::Lb);
        let mut buf = Vec::new();
        save_table_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,exercise,sets,total"));
        assert_eq!(
            lines.next(),
            Some("2024-01-01,Bench Press,10 x 132.3 lb; 8 x 143.3 lb,2469.2 lb")
        );
    }

    #[test]
    fn records_json_is_canonical_kg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        save_records_json(&path, &records()).unwrap();
        let data = std::fs::read_to_string(&path).unwrap();
        let loaded: Vec<WorkoutRecord> = serde_json::from_str(&data).unwrap();
        assert_eq!(loaded, records());
    }
}
