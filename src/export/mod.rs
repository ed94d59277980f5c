//! Export pipeline: CSV of the loaded data, PNG of the rendered chart.
//!
//! ```text
//!  responses ──▶ csv ──┐
//!                      ├──▶ BlobRegistry (staged, revoked on drop) ──▶ DownloadSink
//!  chart ──▶ png ──────┘
//! ```
//!
//! Both exporters report failures as [`ExportError`] values; nothing here
//! panics or unwinds into the UI.

use std::cell::Cell;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::data::model::DataMode;

pub mod blob;
pub mod csv;
pub mod png;
pub mod scene;
pub mod sink;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no {0} data loaded to export")]
    NoData(DataMode),
    #[error("chart element not found")]
    ChartElementNotFound,
    #[error("chart vector graphic not found")]
    VectorGraphicNotFound,
    #[error("chart has an empty bounding box ({width}×{height})")]
    EmptyBoundingBox { width: f32, height: f32 },
    #[error("failed to decode chart image: {0}")]
    ImageDecode(String),
    #[error("failed to draw chart: {0}")]
    Render(String),
    #[error("failed to serialize chart: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

/// What became of an exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Saved(PathBuf),
    /// The user dismissed the save dialog.
    Dismissed,
}

/// `<prefix>_<mode>_<YYYY-MM-DD>.<ext>`
pub fn export_file_name(prefix: &str, mode: DataMode, date: NaiveDate, ext: &str) -> String {
    format!("{prefix}_{mode}_{}.{ext}", date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// "Exporting…" indicator
// ---------------------------------------------------------------------------

/// UI flag that is set while an export runs.
#[derive(Debug, Default)]
pub struct BusyFlag(Cell<bool>);

impl BusyFlag {
    pub fn is_set(&self) -> bool {
        self.0.get()
    }

    /// Set the flag until the guard drops.
    pub fn hold(&self) -> BusyGuard<'_> {
        self.0.set(true);
        BusyGuard(&self.0)
    }
}

pub struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Run one export with the busy flag held, logging the outcome.
pub fn run_guarded<F>(what: &str, busy: &BusyFlag, export: F) -> Result<Delivery, ExportError>
where
    F: FnOnce() -> Result<Delivery, ExportError>,
{
    let _busy = busy.hold();
    let result = export();
    match &result {
        Ok(Delivery::Saved(path)) => log::info!("Exported {what} to {}", path.display()),
        Ok(Delivery::Dismissed) => log::info!("{what} export dismissed"),
        Err(e) => log::error!("{what} export failed: {e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            export_file_name("climate_data", DataMode::Annual, date, "csv"),
            "climate_data_annual_2024-03-07.csv"
        );
    }

    #[test]
    fn busy_flag_cleared_on_failure() {
        let busy = BusyFlag::default();
        let result = run_guarded("CSV", &busy, || {
            assert!(busy.is_set());
            Err(ExportError::NoData(DataMode::Monthly))
        });
        assert!(result.is_err());
        assert!(!busy.is_set());
    }
}
