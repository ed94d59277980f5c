use std::time::Instant;

use eframe::egui;

use crate::config::Config;
use crate::state::AppState;
use crate::theme::Theme;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ClimateExplorerApp {
    pub state: AppState,
}

impl Default for ClimateExplorerApp {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ClimateExplorerApp {
    pub fn new(config: Config) -> Self {
        let mut state = AppState::new(config);
        if let Some(path) = state.config.data_file.clone() {
            state.load_file(&path);
        }
        Self { state }
    }

    /// Pick up the system theme on start-up.
    pub fn with_system_theme(mut self, ctx: &egui::Context) -> Self {
        self.state.theme = Theme::from_dark_mode(ctx.style().visuals.dark_mode);
        self
    }
}

impl eframe::App for ClimateExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.state.theme.visuals());

        // Settle debounced year input; wake up again for the next deadline.
        let now = Instant::now();
        if let Some(deadline) = self.state.poll_year_validation(now) {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }

        // Clicks outside the export dropdown close it.
        if self.state.export_menu.is_open() {
            let click = ctx.input(|i| {
                i.pointer
                    .any_click()
                    .then(|| i.pointer.interact_pos())
                    .flatten()
            });
            if let Some(pos) = click {
                self.state.export_menu.handle_click(pos);
            }
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.state.refresh_data();

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::temperature_chart(ui, &mut self.state);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.dispose();
    }
}
