//! Climate-station temperature explorer: data loading, filtering, charting
//! and export, with an egui front end.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod export;
pub mod filters;
pub mod state;
pub mod theme;
pub mod ui;
