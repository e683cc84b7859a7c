use crate::{
    chart::{VolumeSeries, volume_series},
    model::WorkoutRecord,
    units::WeightUnit,
    view::{TableRow, table_rows},
};
use maud::{Markup, html};
use plotters::prelude::*;
use std::path::Path;

/// Write an HTML report of the log, with a volume chart for `exercise` if given.
///
/// The chart is written as a PNG next to the HTML file.
pub fn export_html_report<P: AsRef<Path>>(
    path: P,
    records: &[WorkoutRecord],
    exercise: Option<&str>,
    unit: WeightUnit,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let rows = table_rows(records, unit);
    let series = exercise.and_then(|ex| volume_series(records, ex, unit));
    let chart_path = path.with_extension("png");
    let chart_file = match &series {
        Some(s) => match generate_volume_chart(s, &chart_path) {
            Ok(_) => chart_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("")),
            Err(e) => {
                log::error!("Failed to generate chart: {}", e);
                std::ffi::OsStr::new("")
            }
        },
        None => std::ffi::OsStr::new(""),
    };
    let markup = build_html(&rows, series.as_ref(), chart_file);
    std::fs::write(path, markup.into_string())
}

fn generate_volume_chart(
    series: &VolumeSeries,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    let max = series
        .points
        .iter()
        .map(|(_, v)| *v)
        .fold(series.y_min + series.y_step, f64::max);
    let labels: Vec<String> = series
        .points
        .iter()
        .map(|(d, _)| d.format("%Y-%m-%d").to_string())
        .collect();
    let mut chart = ChartBuilder::on(&root)
        .caption(&series.label, ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..series.points.len().max(1), series.y_min..max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Date")
        .y_desc(series.axis_title.as_str())
        .x_label_formatter(&|i| labels.get(*i).cloned().unwrap_or_default())
        .draw()?;
    chart.draw_series(LineSeries::new(
        series.points.iter().enumerate().map(|(i, (_, v))| (i, *v)),
        &BLUE,
    ))?;
    root.present()?;
    Ok(())
}

fn build_html(
    rows: &[TableRow],
    series: Option<&VolumeSeries>,
    chart_file: &std::ffi::OsStr,
) -> Markup {
    html! {
        html {
            head { meta charset="utf-8"; title { "Workout Log" } }
            body {
                h1 { "Workouts" }
                @if rows.is_empty() {
                    p { "No workouts logged" }
                } @else {
                    table border="1" {
                        tr { th { "Date" } th { "Exercise" } th { "Sets" } th { "Total" } }
                        @for row in rows {
                            tr {
                                td { (row.date) }
                                td { (row.exercise) }
                                td {
                                    @for (i, set) in row.sets.iter().enumerate() {
                                        @if i > 0 { br; }
                                        (set)
                                    }
                                }
                                td { (row.total_label) }
                            }
                        }
                    }
                }
                @if let Some(series) = series {
                    h1 { (series.label) }
                    @if chart_file.is_empty() {
                        p { "Chart unavailable" }
                    } @else {
                        img src=(chart_file.to_string_lossy());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SetEntry;
    use chrono::NaiveDate;
    use std::ffi::OsStr;

    fn records() -> Vec<WorkoutRecord> {
        vec![WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            exercise: "Bench <Press>".into(),
            sets: vec![
                SetEntry { reps: 10, weight: 60.0 },
                SetEntry { reps: 8, weight: 65.0 },
            ],
        }]
    }

    #[test]
    fn build_html_renders_rows_escaped() {
        let rows = table_rows(&records(), WeightUnit::Kg);
        let output = build_html(&rows, None, OsStr::new("")).into_string();
        assert!(output.contains("Bench &lt;Press&gt;"));
        assert!(output.contains("10 x 60.0 kg<br>8 x 65.0 kg"));
        assert!(output.contains("1120.0 kg"));
        assert!(!output.contains("<img"));
    }

    #[test]
    fn build_html_handles_missing_chart_file() {
        let recs = records();
        let rows = table_rows(&recs, WeightUnit::Lb);
        let series = volume_series(&recs, "Bench <Press>", WeightUnit::Lb);
        let output = build_html(&rows, series.as_ref(), OsStr::new("")).into_string();
        assert!(output.contains("Chart unavailable"));
        assert!(output.contains("2469.2 lb"));
    }

    #[test]
    fn build_html_links_chart() {
        let recs = records();
        let rows = table_rows(&recs, WeightUnit::Kg);
        let series = volume_series(&recs, "Bench <Press>", WeightUnit::Kg);
        let output = build_html(&rows, series.as_ref(), OsStr::new("report.png")).into_string();
        assert!(output.contains("<img src=\"report.png\">"));
    }

    #[test]
    fn empty_log_report_without_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        export_html_report(&path, &[], None, WeightUnit::Kg).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("No workouts logged"));
        assert!(!dir.path().join("report.png").exists());
    }
}
