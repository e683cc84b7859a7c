use chrono::{Datelike, NaiveDate};
use egui_plot::{Line, PlotPoints};

use crate::model::WorkoutRecord;
use crate::units::WeightUnit;

/// Spacing of the value axis ticks, in the display unit.
pub const Y_STEP: f64 = 10.0;

/// Total volume per workout of one exercise, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSeries {
    pub label: String,
    pub axis_title: String,
    pub points: Vec<(NaiveDate, f64)>,
    /// Lowest value snapped down to a multiple of [`Y_STEP`].
    pub y_min: f64,
    pub y_step: f64,
}

impl VolumeSeries {
    /// Points with the date mapped to its day number, for plotting.
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|(d, v)| [d.num_days_from_ce() as f64, *v])
            .collect()
    }

    pub fn line(&self) -> Line {
        Line::new(PlotPoints::from(self.plot_points())).name(&self.label)
    }
}

/// Lower bound of the value axis: the minimum snapped down to a multiple of ten.
pub fn axis_lower_bound(values: &[f64]) -> Option<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    min.is_finite().then(|| (min / Y_STEP).floor() * Y_STEP)
}

/// Build the volume series for `exercise` in `unit`.
///
/// Only exact name matches are used. Workouts on the same date keep their
/// logged order. Returns `None` when the exercise has no workouts.
pub fn volume_series(
    records: &[WorkoutRecord],
    exercise: &str,
    unit: WeightUnit,
) -> Option<VolumeSeries> {
    let mut matching: Vec<&WorkoutRecord> =
        records.iter().filter(|r| r.exercise == exercise).collect();
    matching.sort_by_key(|r| r.date);

    let points: Vec<(NaiveDate, f64)> = matching
        .iter()
        .map(|r| (r.date, unit.display_rounded(r.total_volume())))
        .collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let y_min = axis_lower_bound(&values)?;

    Some(VolumeSeries {
        label: format!("{exercise} progression ({unit})"),
        axis_title: format!("Total Volume ({unit})"),
        points,
        y_min,
        y_step: Y_STEP,
    })
}

/// Format a plot x value (day number) as an ISO date.
pub fn format_day(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{:.0}", value))
}
