use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::derive::Bounds;
use crate::data::filter::RangeFilter;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – range controls
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    let Some(session) = state.session.as_mut() else {
        ui.label("No dataset loaded.");
        return;
    };

    let dataset = &session.dataset;
    let hours_bounds = dataset.hours_bounds();
    let health_bounds = dataset.health_bounds();
    let tempo_bounds = dataset.tempo_bounds();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if let Some(bounds) = hours_bounds {
                range_slider(ui, "Hours Listening per Day", &mut session.filters.hours, bounds);
            }
            if let Some(bounds) = health_bounds {
                range_slider(
                    ui,
                    "Average Mental Health Score",
                    &mut session.filters.avg_health,
                    bounds,
                );
            }
            match (session.filters.tempo.as_mut(), tempo_bounds) {
                (Some(range), Some(bounds)) => {
                    range_slider(ui, "BPM (Beats Per Minute)", range, bounds);
                }
                _ => {
                    ui.label(RichText::new("BPM data not found in this dataset.").italics());
                }
            }

            ui.add_space(8.0);
            if ui.button("Reset filters").clicked() {
                session.reset_filters();
            }
        });
}

/// Two sliders editing an inclusive range. Keeps `min <= max` by dragging the
/// opposite end along. Returns whether either end moved.
pub fn range_slider(ui: &mut Ui, label: &str, range: &mut RangeFilter, bounds: Bounds) -> bool {
    ui.strong(label);
    let span = bounds.min..=bounds.max;
    let min_changed = ui
        .add(egui::Slider::new(&mut range.min, span.clone()).text("min"))
        .changed();
    let max_changed = ui
        .add(egui::Slider::new(&mut range.max, span).text("max"))
        .changed();

    if range.min > range.max {
        if min_changed {
            range.max = range.min;
        } else {
            range.min = range.max;
        }
    }
    ui.add_space(6.0);
    min_changed || max_changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload source").clicked() {
                let source = state
                    .session
                    .as_ref()
                    .map(|s| s.source.clone())
                    .unwrap_or_else(|| state.config.source.clone());
                state.open_source(&source);
                ui.close_menu();
            }
        });

        if let Some(session) = &state.session {
            ui.separator();
            ui.label(RichText::new(&session.source).weak());
        }
    });
}

/// Respondent counts and the last load error, if any.
pub fn status_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui| {
        match &state.session {
            Some(session) => {
                let ds = &session.dataset;
                ui.label(format!(
                    "{} respondents ({} excluded), {} visible",
                    ds.len(),
                    ds.excluded(),
                    session.views().visible.len()
                ));
            }
            None => {
                ui.label("No survey loaded");
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open survey data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_source(&path.to_string_lossy());
    }
}
