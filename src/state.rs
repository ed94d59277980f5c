use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;

use crate::color::StationColors;
use crate::config::Config;
use crate::data::analytics::{self, AnalyticsResponse};
use crate::data::loader;
use crate::data::model::{
    AnnualDataResponse, ClimateDataset, DataMode, MonthlyDataResponse, YearBounds,
};
use crate::data::query::{self, DataQuery};
use crate::export::blob::BlobRegistry;
use crate::export::png::PngOptions;
use crate::export::scene::ChartContainer;
use crate::export::sink::DownloadSink;
use crate::export::{self, BusyFlag, Delivery, ExportError};
use crate::filters::controller::{FilterController, FilterError, YearPreset};
use crate::filters::debounce::DebouncedInputCoordinator;
use crate::filters::validation::{PerField, YearField};
use crate::theme::Theme;
use crate::ui::menu::{ExportMenu, ListenerRegistry};

/// A line for the status area in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<ClimateDataset>,

    /// Station/year/mode/zoom filters.
    pub filters: FilterController,

    /// Raw text of the two year inputs.
    pub year_text: PerField<String>,

    /// Deferred validation of the year inputs.
    pub year_validation: DebouncedInputCoordinator,

    /// Raw text of the zoom center input.
    pub zoom_center_text: String,

    /// Data for the current filters, in the active mode only.
    pub monthly: Option<MonthlyDataResponse>,
    pub annual: Option<AnnualDataResponse>,

    /// Station summaries for the current stations and years.
    pub analytics: Option<AnalyticsResponse>,
    last_query: Option<(DataQuery, DataMode)>,

    /// Series colours by selection order.
    pub colors: StationColors,

    /// The chart drawn last frame, for PNG export.
    pub chart: ChartContainer,

    pub theme: Theme,

    pub export_menu: ExportMenu,
    pub exporting_csv: BusyFlag,
    pub exporting_png: BusyFlag,
    pub blobs: BlobRegistry,

    /// Status / error message shown in the UI.
    pub status_message: Option<StatusMessage>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            filters: FilterController::new(config.default_zoom_window),
            year_validation: DebouncedInputCoordinator::new(config.debounce()),
            year_text: PerField::default(),
            zoom_center_text: String::new(),
            dataset: None,
            monthly: None,
            annual: None,
            analytics: None,
            last_query: None,
            colors: StationColors::default(),
            chart: ChartContainer::default(),
            theme: Theme::default(),
            export_menu: ExportMenu::new(ListenerRegistry::default()),
            exporting_csv: BusyFlag::default(),
            exporting_png: BusyFlag::default(),
            blobs: BlobRegistry::new(),
            status_message: None,
            loading: false,
            config,
        }
    }

    /// Ingest a newly loaded dataset and start from clean filters.
    pub fn set_dataset(&mut self, dataset: ClimateDataset) {
        self.filters.clear();
        self.filters.set_dataset_bounds(dataset.year_bounds());
        self.year_validation.reset();
        self.year_text = PerField::default();
        self.zoom_center_text.clear();

        // Start with the first station so the chart is not empty.
        let first = dataset.stations.first().map(|s| s.id.clone());
        self.filters.set_default_stations(first);

        self.dataset = Some(dataset);
        self.last_query = None;
        self.status_message = None;
        self.loading = false;
        self.refresh_data();
    }

    /// Load a file from disk, reporting failures in the status line.
    pub fn load_file(&mut self, path: &Path) {
        self.loading = true;
        match loader::load_file(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(StatusMessage::Error(format!("Error: {e:#}")));
                self.loading = false;
            }
        }
    }

    /// Years outside this range get a warning.
    pub fn plausible_years(&self) -> YearBounds {
        self.filters
            .dataset_bounds()
            .unwrap_or(self.config.plausible_years)
    }

    /// Recompute the responses when the query or the mode changed.
    pub fn refresh_data(&mut self) {
        let key = (self.filters.query(), self.filters.state().mode);
        if self.last_query.as_ref() == Some(&key) {
            return;
        }

        self.colors = StationColors::new(self.filters.state().selected_stations.iter());
        self.analytics = self
            .dataset
            .as_ref()
            .map(|ds| analytics::analytics(ds, &key.0));
        match &self.dataset {
            Some(ds) => match key.1 {
                DataMode::Monthly => {
                    self.monthly = Some(query::monthly(ds, &key.0));
                    self.annual = None;
                }
                DataMode::Annual => {
                    self.annual = Some(query::annual(ds, &key.0));
                    self.monthly = None;
                }
            },
            None => {
                self.monthly = None;
                self.annual = None;
            }
        }
        self.last_query = Some(key);
    }

    // -- year inputs --

    pub fn on_year_input(&mut self, field: YearField, now: Instant) {
        let raw = self.year_text[field].clone();
        self.year_validation
            .on_input(field, &raw, now, &mut self.filters);
    }

    /// Settle due year validations; returns the next deadline to wake up for.
    pub fn poll_year_validation(&mut self, now: Instant) -> Option<Instant> {
        let plausible = self.plausible_years();
        self.year_validation.poll(now, &self.filters, plausible);
        self.year_validation.next_deadline()
    }

    /// Mirror the controller's year range into the text inputs.
    fn sync_year_text(&mut self) {
        for field in YearField::ALL {
            self.year_text[field] = self
                .filters
                .year(field)
                .map(|y| y.to_string())
                .unwrap_or_default();
        }
        self.year_validation.reset();
    }

    pub fn apply_preset(&mut self, preset: YearPreset) {
        let (from, to) = preset.resolve(self.filters.dataset_bounds());
        self.filters.apply_year_preset(from, to);
        self.sync_year_text();
    }

    // -- zoom --

    pub fn on_zoom_center_input(&mut self) {
        let text = self.zoom_center_text.trim();
        if text.is_empty() {
            self.filters.set_zoom_center(None);
        } else if let Ok(year) = text.parse::<i32>() {
            self.filters.set_zoom_center(Some(year));
        }
    }

    pub fn apply_zoom(&mut self) {
        if self.filters.apply_zoom().is_some() {
            self.sync_year_text();
        }
    }

    pub fn reset_zoom(&mut self) {
        self.filters.reset_zoom();
        self.zoom_center_text.clear();
        self.sync_year_text();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.zoom_center_text.clear();
        self.sync_year_text();
    }

    // -- mode --

    pub fn set_mode(&mut self, mode: DataMode) {
        self.filters.set_mode(mode);
    }

    pub fn set_show_sigma_bounds(&mut self, show: bool) {
        if let Err(FilterError::OverlayRequiresAnnual) = self.filters.set_show_sigma_bounds(show) {
            log::debug!("Ignoring sigma toggle outside annual mode");
        }
    }

    // -- export --

    pub fn export_csv(&mut self, sink: &mut dyn DownloadSink) {
        let mode = self.filters.state().mode;
        let result = export::run_guarded("CSV", &self.exporting_csv, || {
            export::csv::export_csv(
                mode,
                self.monthly.as_ref(),
                self.annual.as_ref(),
                today(),
                &self.blobs,
                sink,
            )
        });
        self.report_export(result);
    }

    pub fn export_png(&mut self, sink: &mut dyn DownloadSink) {
        let options = PngOptions {
            mode: self.filters.state().mode,
            theme: self.theme,
            scale: self.config.png_scale,
            date: today(),
        };
        let result = export::run_guarded("PNG", &self.exporting_png, || {
            export::png::export_png(&self.chart, sink, &options, &self.blobs)
        });
        self.report_export(result);
    }

    fn report_export(&mut self, result: Result<Delivery, ExportError>) {
        self.status_message = match result {
            Ok(Delivery::Saved(path)) => {
                Some(StatusMessage::Info(format!("Saved {}", path.display())))
            }
            Ok(Delivery::Dismissed) => None,
            Err(e) => Some(StatusMessage::Error(format!("Export failed: {e}"))),
        };
    }

    /// Teardown: nothing may fire after the window closes.
    pub fn dispose(&mut self) {
        self.year_validation.cancel_all();
        self.export_menu.close();
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::export::sink::MemorySink;

    const SAMPLE: &str = "\
Station Number;Year;Jan;Feb;Mar;Apr;May;Jun;Jul;Aug;Sep;Oct;Nov;Dec
1;1859;1;2;3;4;5;6;7;8;9;10;11;12
1;2019;1;2;3;4;5;6;7;8;9;10;11;12
2;1950;5;5;5;5;5;5;5;5;5;5;5;5
";

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(read_csv(SAMPLE.as_bytes()).unwrap());
        state
    }

    #[test]
    fn loading_selects_first_station() {
        let state = loaded();
        assert_eq!(state.filters.query().stations, vec!["1"]);
        assert_eq!(state.monthly.as_ref().unwrap().total_points, 24);
        assert_eq!(state.plausible_years(), YearBounds::new(1859, 2019));
    }

    #[test]
    fn clearing_filters_keeps_initial_station() {
        let mut state = loaded();
        assert!(!state.filters.has_active_filters());

        state.filters.toggle_station("2");
        state.set_mode(DataMode::Annual);
        state.clear_filters();
        state.refresh_data();

        assert_eq!(state.filters.query().stations, vec!["1"]);
        assert!(!state.filters.has_active_filters());
        assert_eq!(state.monthly.as_ref().unwrap().stations.len(), 1);
    }

    #[test]
    fn analytics_follow_the_selection() {
        let mut state = loaded();
        let summary = state.analytics.as_ref().unwrap();
        assert_eq!(summary.total_stations, 1);
        assert_eq!(summary.stations[0].hottest_year, 1859);

        state.filters.toggle_station("2");
        state.refresh_data();
        let summary = state.analytics.as_ref().unwrap();
        assert_eq!(summary.total_stations, 2);
        assert_eq!(summary.stations[1].mean_temp, 5.0);
    }

    #[test]
    fn mode_switch_recomputes_active_response() {
        let mut state = loaded();
        state.set_mode(DataMode::Annual);
        state.refresh_data();
        assert!(state.monthly.is_none());
        assert_eq!(state.annual.as_ref().unwrap().total_years, 2);
    }

    #[test]
    fn zoom_apply_updates_year_text() {
        let mut state = loaded();
        state.zoom_center_text = "2010".into();
        state.on_zoom_center_input();
        state.filters.set_zoom_window(20);
        state.apply_zoom();
        assert_eq!(state.year_text[YearField::From], "1990");
        assert_eq!(state.year_text[YearField::To], "2019");

        state.reset_zoom();
        assert!(state.year_text[YearField::From].is_empty());
        assert_eq!(state.filters.state().year_from, None);
    }

    #[test]
    fn csv_export_failure_is_reported_not_raised() {
        let mut state = AppState::default();
        let mut sink = MemorySink::default();
        state.export_csv(&mut sink);
        assert!(matches!(state.status_message, Some(StatusMessage::Error(_))));
        assert!(!state.exporting_csv.is_set());
    }

    #[test]
    fn png_export_without_chart_reports_missing_element() {
        let mut state = loaded();
        let mut sink = MemorySink::default();
        state.export_png(&mut sink);
        assert_eq!(
            state.status_message,
            Some(StatusMessage::Error("Export failed: chart element not found".into()))
        );
        assert_eq!(state.blobs.live_count(), 0);
        assert!(!state.exporting_png.is_set());
    }
}
