use std::time::Instant;

use eframe::egui::{self, Button, Checkbox, CollapsingHeader, Grid, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::analytics::StationAnalytics;
use crate::data::model::DataMode;
use crate::export::sink::SaveDialogSink;
use crate::filters::controller::YearPreset;
use crate::filters::validation::YearField;
use crate::filters::zoom::{MAX_WINDOW, MIN_WINDOW, WINDOW_STEP};
use crate::state::{AppState, StatusMessage};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            station_table(ui, state);
            ui.separator();
            mode_selector(ui, state);
            ui.separator();
            year_inputs(ui, state);
            ui.separator();
            zoom_controls(ui, state);
            ui.separator();
            statistics(ui, state);
            ui.separator();

            if ui
                .add_enabled(state.filters.has_active_filters(), Button::new("Clear filters"))
                .clicked()
            {
                state.clear_filters();
            }
        });
}

fn station_table(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let selected = &state.filters.state().selected_stations;
    ui.strong(format!("Stations  ({}/{})", selected.len(), dataset.stations.len()));

    let mut toggled: Option<String> = None;
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(220.0)
        .column(Column::auto())
        .column(Column::remainder())
        .column(Column::auto())
        .header(18.0, |mut header| {
            header.col(|_ui| {});
            header.col(|ui| {
                ui.strong("Name");
            });
            header.col(|ui| {
                ui.strong("ID");
            });
        })
        .body(|mut body| {
            for station in &dataset.stations {
                body.row(20.0, |mut row| {
                    row.col(|ui| {
                        let mut checked = selected.contains(&station.id);
                        if ui.checkbox(&mut checked, "").changed() {
                            toggled = Some(station.id.clone());
                        }
                    });
                    row.col(|ui| {
                        let mut text = RichText::new(&station.name);
                        if selected.contains(&station.id) {
                            text = text.color(state.colors.color_for(&station.id));
                        }
                        ui.label(text);
                    });
                    row.col(|ui| {
                        ui.label(&station.id);
                    });
                });
            }
        });

    if let Some(id) = toggled {
        state.filters.toggle_station(&id);
    }
}

fn mode_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Data");
    let current = state.filters.state().mode;
    ui.horizontal(|ui: &mut Ui| {
        for mode in [DataMode::Monthly, DataMode::Annual] {
            let label = match mode {
                DataMode::Monthly => "Monthly",
                DataMode::Annual => "Annual",
            };
            if ui.selectable_label(current == mode, label).clicked() {
                state.set_mode(mode);
            }
        }
    });

    let annual = state.filters.state().mode == DataMode::Annual;
    let mut show = state.filters.state().show_sigma_bounds;
    if ui
        .add_enabled(annual, Checkbox::new(&mut show, "Show ±1σ bounds"))
        .changed()
    {
        state.set_show_sigma_bounds(show);
    }
}

fn year_inputs(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Years");
    let theme = state.theme;

    for field in YearField::ALL {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(field.to_string());
            let edit = egui::TextEdit::singleline(&mut state.year_text[field])
                .desired_width(64.0)
                .hint_text("any");
            if ui.add(edit).changed() {
                state.on_year_input(field, Instant::now());
            }
        });

        let feedback = state.year_validation.feedback(field);
        if let Some(error) = &feedback.error {
            ui.label(RichText::new(error).small().color(theme.error_color()));
        } else if let Some(warning) = &feedback.warning {
            ui.label(RichText::new(warning).small().color(theme.warning_color()));
        }
    }
    if let Some(error) = state.year_validation.range_error() {
        ui.label(RichText::new(error).small().color(theme.error_color()));
    }

    let presets: Vec<YearPreset> = std::iter::once(YearPreset::All)
        .chain(state.config.year_presets.iter().map(|&n| YearPreset::Last(n)))
        .collect();
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for preset in presets {
            if ui.small_button(preset.label()).clicked() {
                state.apply_preset(preset);
            }
        }
    });
}

fn zoom_controls(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Zoom");

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Center year");
        let edit = egui::TextEdit::singleline(&mut state.zoom_center_text)
            .desired_width(64.0)
            .hint_text("none");
        if ui.add(edit).changed() {
            state.on_zoom_center_input();
        }
    });

    let zoom = state.filters.state().zoom;
    let mut window = zoom.window_size();
    let slider = egui::Slider::new(&mut window, MIN_WINDOW..=MAX_WINDOW)
        .step_by(WINDOW_STEP as f64)
        .text("± years");
    if ui.add_enabled(zoom.center_year().is_some(), slider).changed() {
        state.filters.set_zoom_window(window);
    }

    if let Some((from, to)) = state.filters.zoom_preview() {
        ui.label(RichText::new(format!("Will show {from}–{to}")).small());
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(state.filters.has_unapplied_zoom(), Button::new("Apply"))
            .clicked()
        {
            state.apply_zoom();
        }
        if ui.button("Reset").clicked() {
            state.reset_zoom();
        }
    });
}

fn statistics(ui: &mut Ui, state: &AppState) {
    let Some(summary) = &state.analytics else {
        return;
    };
    CollapsingHeader::new(format!("Statistics  ({})", summary.year_range))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if summary.stations.is_empty() {
                ui.label("No readings in range.");
            }
            for station in &summary.stations {
                let name = RichText::new(&station.station_name)
                    .strong()
                    .color(state.colors.color_for(&station.station_id));
                ui.label(name);
                station_statistics(ui, station);
                ui.add_space(4.0);
            }
        });
}

fn station_statistics(ui: &mut Ui, s: &StationAnalytics) {
    Grid::new(("station_stats", &s.station_id))
        .num_columns(2)
        .spacing([12.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            let rows = [
                ("Mean", format!("{:.2} °C  (σ {:.2})", s.mean_temp, s.std_temp)),
                (
                    "Lowest",
                    format!("{:.2} °C  ({}-{:02})", s.min_temp, s.min_temp_year, s.min_temp_month),
                ),
                (
                    "Highest",
                    format!("{:.2} °C  ({}-{:02})", s.max_temp, s.max_temp_year, s.max_temp_month),
                ),
                ("Coldest year", format!("{}  ({:.2} °C)", s.coldest_year, s.coldest_year_temp)),
                ("Hottest year", format!("{}  ({:.2} °C)", s.hottest_year, s.hottest_year_temp)),
                ("Coverage", format!("{:.1} %", s.data_coverage)),
            ];
            for (label, value) in rows {
                ui.label(RichText::new(label).small());
                ui.label(RichText::new(value).small());
                ui.end_row();
            }
        });
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
        });

        ui.separator();

        let theme_label = if state.theme.is_dark() { "☀ Light" } else { "🌙 Dark" };
        if ui.button(theme_label).clicked() {
            state.theme = state.theme.toggled();
        }

        export_menu(ui, state);

        ui.separator();

        if let Some(ds) = &state.dataset {
            let years = ds
                .year_bounds()
                .map(|b| b.to_string())
                .unwrap_or_else(|| "no years".into());
            ui.label(format!("{} stations, {years}", ds.stations.len()));
        }

        match &state.status_message {
            Some(StatusMessage::Info(msg)) => {
                ui.label(msg);
            }
            Some(StatusMessage::Error(msg)) => {
                ui.label(RichText::new(msg).color(state.theme.error_color()));
            }
            None => {}
        }
    });
}

/// The "Export" button and its dropdown.
fn export_menu(ui: &mut Ui, state: &mut AppState) {
    let button = ui.add_enabled(state.dataset.is_some(), Button::new("Export ▾"));
    if button.clicked() {
        state.export_menu.toggle();
    }
    if !state.export_menu.is_open() {
        return;
    }

    let csv_busy = state.exporting_csv.is_set();
    let png_busy = state.exporting_png.is_set();
    let mut choice = None;

    let area = egui::Area::new(egui::Id::new("export_menu"))
        .order(egui::Order::Foreground)
        .fixed_pos(button.rect.left_bottom())
        .show(ui.ctx(), |ui: &mut Ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui: &mut Ui| {
                let csv_label = if csv_busy { "Exporting…" } else { "Data as CSV" };
                if ui.add_enabled(!csv_busy, Button::new(csv_label)).clicked() {
                    choice = Some(ExportChoice::Csv);
                }
                let png_label = if png_busy { "Exporting…" } else { "Chart as PNG" };
                if ui.add_enabled(!png_busy, Button::new(png_label)).clicked() {
                    choice = Some(ExportChoice::Png);
                }
            });
        });
    state.export_menu.set_area(area.response.rect.union(button.rect));

    if let Some(choice) = choice {
        state.export_menu.close();
        let mut sink = SaveDialogSink;
        match choice {
            ExportChoice::Csv => state.export_csv(&mut sink),
            ExportChoice::Png => state.export_png(&mut sink),
        }
    }
}

#[derive(Clone, Copy)]
enum ExportChoice {
    Csv,
    Png,
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open climate data")
        .add_filter("Supported files", &["csv", "txt", "json"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_file(&path);
    }
}
