/// Rendering: egui panels and the chart. All mutation goes through `AppState`.
pub mod menu;
pub mod panels;
pub mod plot;
