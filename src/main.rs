use climate_explorer::app::ClimateExplorerApp;
use climate_explorer::config::Config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match Config::from_args(std::env::args()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            Config::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Climate Explorer",
        options,
        Box::new(|cc| Ok(Box::new(ClimateExplorerApp::new(config).with_system_theme(&cc.egui_ctx)))),
    )
}
