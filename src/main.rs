//! Workout log desktop app and persistent user settings.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Legend, Plot, uniform_grid_spacer};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chrono::NaiveDate;
use log::info;

mod chart;
use chart::{format_day, volume_series};
mod export;
use export::{save_records_json, save_table_csv_file};
mod model;
mod report;
use report::export_html_report;
mod storage;
use storage::{FileKvStore, KvStore, MemoryKvStore, resolve_data_dir};
mod store;
use store::{WorkoutStore, parse_set_input};
mod units;
mod view;
use view::{exercise_names, table_rows};

fn default_chart_height() -> f32 {
    240.0
}

fn default_show_chart() -> bool {
    true
}

/// Persistent configuration for user preferences.
///
/// Serialized to a JSON file in the platform config directory. Every field
/// has a serde default so older or partial files still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    /// Overrides the platform data directory for workout storage.
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    selected_exercise: Option<String>,
    #[serde(default = "default_chart_height")]
    chart_height: f32,
    #[serde(default = "default_show_chart")]
    show_chart: bool,
}

impl Settings {
    const FILE: &'static str = "workout_log_settings.json";

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring unreadable settings {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        log::error!("Failed to save settings: {e}");
                    }
                }
                Err(e) => log::error!("Failed to serialize settings: {e}"),
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            selected_exercise: None,
            chart_height: default_chart_height(),
            show_chart: default_show_chart(),
        }
    }
}

fn open_kv_store(settings: &Settings) -> Box<dyn KvStore> {
    match resolve_data_dir(settings.data_dir.as_deref()) {
        Some(dir) => {
            info!("Storing workouts in {}", dir.display());
            Box::new(FileKvStore::new(dir))
        }
        None => {
            log::warn!("No data directory available; workouts will not be saved");
            Box::new(MemoryKvStore::new())
        }
    }
}

/// Text fields of the entry form.
#[derive(Debug, Default)]
struct EntryForm {
    exercise: String,
    reps: String,
    weight: String,
}

struct WorkoutApp {
    store: WorkoutStore<Box<dyn KvStore>>,
    settings: Settings,
    form: EntryForm,
    entry_date: NaiveDate,
    status: Option<String>,
    settings_dirty: bool,
}

impl WorkoutApp {
    fn new(settings: Settings) -> Self {
        let store = WorkoutStore::open(open_kv_store(&settings));
        let status = store.load_warning().map(str::to_string);
        let entry_date = store.last_date();
        Self {
            store,
            settings,
            form: EntryForm::default(),
            entry_date,
            status,
            settings_dirty: false,
        }
    }

    fn stage_set(&mut self) {
        let staged = parse_set_input(&self.form.reps, &self.form.weight)
            .and_then(|(reps, weight)| self.store.add_pending_set(reps, weight));
        match staged {
            Ok(()) => {
                self.form.reps.clear();
                self.form.weight.clear();
                self.status = None;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn commit(&mut self) {
        match self
            .store
            .commit_workout(Some(self.entry_date), &self.form.exercise)
        {
            Ok(count) => {
                self.form = EntryForm::default();
                self.entry_date = self.store.last_date();
                self.status = Some(format!("Saved workout ({count} logged)"));
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn delete(&mut self, index: usize) {
        match self.store.delete_workout(index) {
            Ok(Some(removed)) => {
                self.status = Some(format!("Deleted {} on {}", removed.exercise, removed.date));
            }
            Ok(None) => {}
            Err(e) => self.status = Some(format!("Delete failed: {e}")),
        }
    }

    fn toggle_unit(&mut self) {
        if let Err(e) = self.store.toggle_unit() {
            log::error!("Failed to save unit preference: {e}");
            self.status = Some(format!("Unit preference not saved: {e}"));
        }
    }

    fn export_records(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("JSON", &["json"])
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            let result = match path
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_lowercase())
            {
                Some(ext) if ext == "csv" => {
                    let rows = table_rows(self.store.records(), self.store.unit());
                    save_table_csv_file(&path, &rows).map_err(|e| e.to_string())
                }
                _ => save_records_json(&path, self.store.records()).map_err(|e| e.to_string()),
            };
            match result {
                Ok(()) => info!("Exported workouts to {}", path.display()),
                Err(e) => {
                    log::error!("Failed to export workouts: {e}");
                    self.status = Some(format!("Export failed: {e}"));
                }
            }
        }
    }

    fn export_report(&mut self) {
        if let Some(path) = FileDialog::new().add_filter("HTML", &["html"]).save_file() {
            match export_html_report(
                &path,
                self.store.records(),
                self.settings.selected_exercise.as_deref(),
                self.store.unit(),
            ) {
                Ok(()) => {
                    info!("Wrote report to {}", path.display());
                    if let Err(e) = open::that(&path) {
                        log::warn!("Could not open report: {e}");
                    }
                }
                Err(e) => {
                    log::error!("Failed to write report: {e}");
                    self.status = Some(format!("Report failed: {e}"));
                }
            }
        }
    }

    fn entry_panel(&mut self, ui: &mut egui::Ui) {
        let unit = self.store.unit();
        egui::Grid::new("entry_grid").num_columns(2).show(ui, |ui| {
            ui.label("Date:");
            ui.add(DatePickerButton::new(&mut self.entry_date).id_source("entry_date"));
            ui.end_row();

            ui.label("Exercise:");
            ui.text_edit_singleline(&mut self.form.exercise);
            ui.end_row();

            ui.label("Reps:");
            ui.text_edit_singleline(&mut self.form.reps);
            ui.end_row();

            ui.label(format!("Weight ({unit}):"));
            ui.text_edit_singleline(&mut self.form.weight);
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Add Set").clicked() {
                self.stage_set();
            }
            if ui.button("Save Workout").clicked() {
                self.commit();
            }
        });

        let mut remove = None;
        for (i, set) in self.store.pending_sets().iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("Set {}: {}", i + 1, view::describe_set(set, unit)));
                if ui.small_button("Remove").clicked() {
                    remove = Some(i);
                }
            });
        }
        if let Some(i) = remove {
            self.store.remove_pending_set(i);
        }
    }

    fn workout_table(&mut self, ui: &mut egui::Ui) {
        let rows = table_rows(self.store.records(), self.store.unit());
        if rows.is_empty() {
            ui.label("No workouts logged yet.");
            return;
        }
        let mut delete = None;
        let row_height = ui.text_style_height(&egui::TextStyle::Body);
        egui_extras::TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .column(egui_extras::Column::auto())
            .header(row_height, |mut header| {
                header.col(|ui| {
                    ui.strong("Date");
                });
                header.col(|ui| {
                    ui.strong("Exercise");
                });
                header.col(|ui| {
                    ui.strong("Sets");
                });
                header.col(|ui| {
                    ui.strong("Total");
                });
                header.col(|_| {});
            })
            .body(|mut body| {
                for r in &rows {
                    let height = row_height * r.sets.len().max(1) as f32 + 4.0;
                    body.row(height, |mut row| {
                        row.col(|ui| {
                            ui.label(&r.date);
                        });
                        row.col(|ui| {
                            ui.label(&r.exercise);
                        });
                        row.col(|ui| {
                            ui.label(r.sets.join("\n"));
                        });
                        row.col(|ui| {
                            ui.label(format!("{} total", r.total_label));
                        });
                        row.col(|ui| {
                            if ui.small_button("❌").clicked() {
                                delete = Some(r.index);
                            }
                        });
                    });
                }
            });
        if let Some(i) = delete {
            self.delete(i);
        }
    }

    fn chart_panel(&mut self, ui: &mut egui::Ui) {
        let names = exercise_names(self.store.records());
        let mut selected = self.settings.selected_exercise.clone();
        egui::ComboBox::from_id_source("exercise_select")
            .selected_text(selected.as_deref().unwrap_or("-- Select Exercise --"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "-- Select Exercise --");
                for name in &names {
                    ui.selectable_value(&mut selected, Some(name.clone()), name);
                }
            });
        if selected != self.settings.selected_exercise {
            self.settings.selected_exercise = selected;
            self.settings_dirty = true;
        }

        let Some(exercise) = self.settings.selected_exercise.as_deref() else {
            return;
        };
        // Re-derived every frame, so a unit toggle also refreshes the axis bound.
        let Some(series) = volume_series(self.store.records(), exercise, self.store.unit()) else {
            ui.label("No workouts for this exercise.");
            return;
        };
        let step = series.y_step;
        Plot::new("volume_plot")
            .height(self.settings.chart_height)
            .x_axis_formatter(move |mark, _chars, _| format_day(mark.value))
            .y_axis_label(series.axis_title.clone())
            .include_y(series.y_min)
            .y_grid_spacer(uniform_grid_spacer(move |_| [step, step * 5.0, step * 10.0]))
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.line(series.line());
            });
    }
}

impl App for WorkoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Workouts").clicked() {
                        self.export_records();
                        ui.close_menu();
                    }
                    if ui.button("Export Report").clicked() {
                        self.export_report();
                        ui.close_menu();
                    }
                    if ui
                        .checkbox(&mut self.settings.show_chart, "Show Chart")
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                });
                let other = self.store.unit().toggled();
                if ui.button(format!("Switch to {other}")).clicked() {
                    self.toggle_unit();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or(""));
                if self.status.is_some() && ui.small_button("Dismiss").clicked() {
                    self.status = None;
                }
            });
        });

        egui::SidePanel::left("entry_panel").show(ctx, |ui| {
            ui.heading("Log Workout");
            self.entry_panel(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.settings.show_chart {
                ui.heading("Progress");
                self.chart_panel(ui);
                ui.separator();
            }
            ui.heading("Workouts");
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.workout_table(ui);
            });
        });

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let settings = Settings::load();
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Log",
        options,
        Box::new(|_cc| Box::new(WorkoutApp::new(settings))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn settings_roundtrip() {
        let s = Settings {
            data_dir: Some(PathBuf::from("/tmp/workouts")),
            selected_exercise: Some("Bench Press".into()),
            chart_height: 320.0,
            show_chart: false,
        };
        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn settings_persist_and_default_missing_fields() {
        use std::env;
        use std::fs;

        let _guard = ENV_MUTEX.lock().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let prev_config = env::var_os("XDG_CONFIG_HOME");
        unsafe {
            env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let mut s = Settings::default();
        s.selected_exercise = Some("Squat".into());
        s.save();
        let loaded = Settings::load();
        assert_eq!(loaded.selected_exercise.as_deref(), Some("Squat"));

        let path = Settings::path().unwrap();
        fs::write(&path, "{}").unwrap();
        let missing = Settings::load();
        assert_eq!(missing, Settings::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load(), Settings::default());

        unsafe {
            match prev_config {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    #[test]
    fn app_stages_and_commits_through_store() {
        let kv: Box<dyn KvStore> = Box::new(MemoryKvStore::new());
        let mut app = WorkoutApp {
            store: WorkoutStore::open_with_date(kv, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            settings: Settings::default(),
            form: EntryForm::default(),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: None,
            settings_dirty: false,
        };

        app.form.reps = "10".into();
        app.form.weight = "abc".into();
        app.stage_set();
        assert!(app.status.is_some());
        assert!(app.store.pending_sets().is_empty());

        app.form.weight = "60".into();
        app.stage_set();
        app.form.reps = "8".into();
        app.form.weight = "65".into();
        app.stage_set();
        assert_eq!(app.store.pending_sets().len(), 2);

        app.form.exercise = "Bench Press".into();
        app.commit();
        assert_eq!(app.store.records().len(), 1);
        assert!(app.form.exercise.is_empty());

        app.toggle_unit();
        let rows = table_rows(app.store.records(), app.store.unit());
        assert_eq!(rows[0].total_label, "2469.2 lb");

        app.delete(5);
        assert_eq!(app.store.records().len(), 1);
        app.delete(0);
        assert!(app.store.records().is_empty());
    }
}
