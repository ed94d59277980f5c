use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Polygon};

use crate::data::model::DataMode;
use crate::export::scene::{self, BoundingBox, ChartElement, ChartScene};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Temperature chart (central panel)
// ---------------------------------------------------------------------------

/// Render the temperature chart and record it as the export source.
pub fn temperature_chart(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        state.chart.set(None);
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view temperatures  (File → Open…)");
        });
        return;
    }
    if state.filters.state().selected_stations.is_empty() {
        state.chart.set(None);
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Select at least one station.");
        });
        return;
    }

    let mut scene = build_scene(state);

    let response = Plot::new("temperature_plot")
        .legend(Legend::default())
        .x_axis_label(scene::X_AXIS_LABEL)
        .y_axis_label(scene::Y_AXIS_LABEL)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for band in &scene.bands {
                let [r, g, b] = band.color;
                let outline: PlotPoints = band
                    .upper
                    .iter()
                    .chain(band.lower.iter().rev())
                    .copied()
                    .collect();
                plot_ui.polygon(
                    Polygon::new(outline)
                        .fill_color(Color32::from_rgba_unmultiplied(r, g, b, 48))
                        .stroke(Stroke::NONE),
                );
            }

            for series in &scene.series {
                let [r, g, b] = series.color;
                for segment in &series.segments {
                    let points: PlotPoints = segment.iter().copied().collect();
                    plot_ui.line(
                        Line::new(points)
                            .name(&series.label)
                            .color(Color32::from_rgb(r, g, b))
                            .width(1.5),
                    );
                }
            }
        });

    // Export what is on screen, including any pan or zoom.
    let view = response.transform.bounds();
    scene.set_view((view.min()[0], view.max()[0]), (view.min()[1], view.max()[1]));

    let rect = response.response.rect;
    state.chart.set(Some(ChartElement {
        bounding_box: BoundingBox {
            width: rect.width(),
            height: rect.height(),
        },
        graphic: (!scene.is_empty()).then_some(scene),
    }));
}

fn build_scene(state: &AppState) -> ChartScene {
    let theme = state.theme;
    match state.filters.state().mode {
        DataMode::Monthly => match &state.monthly {
            Some(resp) => {
                let colors: Vec<[u8; 3]> = resp
                    .stations
                    .iter()
                    .map(|s| state.colors.rgb_for(&s.station_id))
                    .collect();
                scene::monthly_scene(resp, &colors, theme)
            }
            None => ChartScene::default(),
        },
        DataMode::Annual => match &state.annual {
            Some(resp) => {
                let colors: Vec<[u8; 3]> = resp
                    .stations
                    .iter()
                    .map(|s| state.colors.rgb_for(&s.station_id))
                    .collect();
                scene::annual_scene(resp, &colors, state.filters.state().show_sigma_bounds, theme)
            }
            None => ChartScene::default(),
        },
    }
}
