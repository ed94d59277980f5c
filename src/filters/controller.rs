use indexmap::IndexSet;
use thiserror::Error;

use crate::data::model::{DataMode, YearBounds};
use crate::data::query::DataQuery;

use super::validation::YearField;
use super::zoom::{self, ZoomState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("the sigma overlay is only available in annual mode")]
    OverlayRequiresAnnual,
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Everything the user can filter on.
///
/// Selection order is kept so chart colours stay stable while stations are
/// added and removed.
#[derive(Debug, Clone, PartialEq)]
pub struct FiltersState {
    pub selected_stations: IndexSet<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub mode: DataMode,
    /// Only meaningful in annual mode.
    pub show_sigma_bounds: bool,
    pub zoom: ZoomState,
}

impl FiltersState {
    fn initial(default_window: u32, default_stations: &IndexSet<String>) -> Self {
        Self {
            selected_stations: default_stations.clone(),
            year_from: None,
            year_to: None,
            mode: DataMode::Monthly,
            show_sigma_bounds: false,
            zoom: ZoomState::initial(default_window),
        }
    }
}

/// Quick year ranges relative to the last year of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearPreset {
    All,
    /// The last `n` years, inclusive of the final year.
    Last(u32),
}

impl YearPreset {
    /// The `(from, to)` pair this preset selects.
    pub fn resolve(self, bounds: Option<YearBounds>) -> (Option<i32>, Option<i32>) {
        match (self, bounds) {
            (YearPreset::All, _) | (YearPreset::Last(_), None) => (None, None),
            (YearPreset::Last(n), Some(b)) => {
                let from = b.max - n as i32 + 1;
                (Some(b.clamp(from)), Some(b.max))
            }
        }
    }

    pub fn label(self) -> String {
        match self {
            YearPreset::All => "All".to_string(),
            YearPreset::Last(n) => format!("Last {n}y"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Sole owner of the filter state and the applied-zoom baseline.
///
/// All mutation goes through the methods below so the mode/overlay and
/// zoom/applied-zoom invariants hold after every call.
#[derive(Debug, Clone)]
pub struct FilterController {
    state: FiltersState,
    applied_zoom: ZoomState,
    default_window: u32,
    /// Selection that counts as "no filter", e.g. the station shown on load.
    default_stations: IndexSet<String>,
    dataset_bounds: Option<YearBounds>,
}

impl FilterController {
    pub fn new(default_window: u32) -> Self {
        let default_window = zoom::snap_window(default_window);
        let default_stations = IndexSet::new();
        Self {
            state: FiltersState::initial(default_window, &default_stations),
            applied_zoom: ZoomState::initial(default_window),
            default_window,
            default_stations,
            dataset_bounds: None,
        }
    }

    pub fn state(&self) -> &FiltersState {
        &self.state
    }

    pub fn applied_zoom(&self) -> &ZoomState {
        &self.applied_zoom
    }

    pub fn dataset_bounds(&self) -> Option<YearBounds> {
        self.dataset_bounds
    }

    /// Year limits used to clamp zoom ranges and resolve presets.
    pub fn set_dataset_bounds(&mut self, bounds: Option<YearBounds>) {
        self.dataset_bounds = bounds;
    }

    // -- selection --

    pub fn set_selected_stations<I>(&mut self, stations: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.state.selected_stations = stations.into_iter().collect();
    }

    /// Make `stations` the baseline selection and select them.
    ///
    /// `clear` returns to this selection and it does not count as an active
    /// filter.
    pub fn set_default_stations<I>(&mut self, stations: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.default_stations = stations.into_iter().collect();
        self.state.selected_stations = self.default_stations.clone();
    }

    /// Add the station at the end of the selection, or remove it.
    pub fn toggle_station(&mut self, id: &str) {
        if !self.state.selected_stations.shift_remove(id) {
            self.state.selected_stations.insert(id.to_string());
        }
    }

    // -- years --

    pub fn set_year(&mut self, field: YearField, value: Option<i32>) {
        match field {
            YearField::From => self.state.year_from = value,
            YearField::To => self.state.year_to = value,
        }
    }

    pub fn year(&self, field: YearField) -> Option<i32> {
        match field {
            YearField::From => self.state.year_from,
            YearField::To => self.state.year_to,
        }
    }

    pub fn set_year_from(&mut self, value: Option<i32>) {
        self.set_year(YearField::From, value);
    }

    pub fn set_year_to(&mut self, value: Option<i32>) {
        self.set_year(YearField::To, value);
    }

    /// Set both bounds at once (preset buttons).
    pub fn apply_year_preset(&mut self, from: Option<i32>, to: Option<i32>) {
        self.state.year_from = from;
        self.state.year_to = to;
    }

    // -- mode / overlay --

    /// Switching to monthly turns the sigma overlay off in the same update.
    pub fn set_mode(&mut self, mode: DataMode) {
        self.state.mode = mode;
        if mode != DataMode::Annual {
            self.state.show_sigma_bounds = false;
        }
    }

    pub fn set_show_sigma_bounds(&mut self, show: bool) -> Result<(), FilterError> {
        if self.state.mode != DataMode::Annual {
            return Err(FilterError::OverlayRequiresAnnual);
        }
        self.state.show_sigma_bounds = show;
        Ok(())
    }

    // -- zoom --

    pub fn set_zoom(&mut self, zoom: ZoomState) {
        self.state.zoom = zoom;
        if zoom.center_year().is_none() {
            self.applied_zoom = ZoomState::initial(self.default_window);
        }
    }

    pub fn set_zoom_center(&mut self, center_year: Option<i32>) {
        let window = self.state.zoom.window_size();
        self.set_zoom(ZoomState::new(center_year, window));
    }

    pub fn set_zoom_window(&mut self, window_size: u32) {
        let center = self.state.zoom.center_year();
        self.set_zoom(ZoomState::new(center, window_size));
    }

    /// Commit the zoom window into the year range.
    ///
    /// Returns the committed range, or `None` (and changes nothing) without a
    /// center year.
    pub fn apply_zoom(&mut self) -> Option<(i32, i32)> {
        let (from, to) = self.state.zoom.range(self.dataset_bounds)?;
        self.state.year_from = Some(from);
        self.state.year_to = Some(to);
        self.applied_zoom = self.state.zoom;
        log::debug!("Applied zoom {:?} → {from}–{to}", self.state.zoom);
        Some((from, to))
    }

    /// Full reset of the year dimension: range, zoom and applied zoom.
    pub fn reset_zoom(&mut self) {
        self.state.year_from = None;
        self.state.year_to = None;
        self.state.zoom = ZoomState::initial(self.default_window);
        self.applied_zoom = ZoomState::initial(self.default_window);
    }

    /// Back to the initial state, keeping the dataset bounds.
    pub fn clear(&mut self) {
        self.state = FiltersState::initial(self.default_window, &self.default_stations);
        self.applied_zoom = ZoomState::initial(self.default_window);
    }

    // -- derived --

    pub fn has_active_filters(&self) -> bool {
        let s = &self.state;
        s.selected_stations != self.default_stations
            || s.year_from.is_some()
            || s.year_to.is_some()
            || s.mode != DataMode::Monthly
            || s.show_sigma_bounds
    }

    /// Drives whether "Apply" is enabled.
    pub fn has_unapplied_zoom(&self) -> bool {
        zoom::has_unapplied(&self.state.zoom, &self.applied_zoom)
    }

    /// The range "Apply" would commit right now.
    ///
    /// Out-of-range windows are shown clamped here but the zoom state itself
    /// is only clamped on commit.
    pub fn zoom_preview(&self) -> Option<(i32, i32)> {
        self.state.zoom.range(self.dataset_bounds)
    }

    /// Data request for the current selection and year range.
    pub fn query(&self) -> DataQuery {
        DataQuery {
            stations: self.state.selected_stations.iter().cloned().collect(),
            year_from: self.state.year_from,
            year_to: self.state.year_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FilterController {
        let mut c = FilterController::new(10);
        c.set_dataset_bounds(Some(YearBounds::new(1859, 2019)));
        c
    }

    #[test]
    fn monthly_mode_forces_overlay_off() {
        let mut c = controller();
        c.set_mode(DataMode::Annual);
        c.set_show_sigma_bounds(true).unwrap();
        assert!(c.state().show_sigma_bounds);

        c.set_mode(DataMode::Monthly);
        assert!(!c.state().show_sigma_bounds);
        assert_eq!(
            c.set_show_sigma_bounds(true),
            Err(FilterError::OverlayRequiresAnnual)
        );
        assert!(!c.state().show_sigma_bounds);
    }

    #[test]
    fn apply_zoom_clamps_upper_bound() {
        let mut c = controller();
        c.set_zoom(ZoomState::new(Some(2010), 20));
        assert!(c.has_unapplied_zoom());
        assert_eq!(c.apply_zoom(), Some((1990, 2019)));
        assert_eq!((c.state().year_from, c.state().year_to), (Some(1990), Some(2019)));
        assert!(!c.has_unapplied_zoom());
        assert_eq!(c.applied_zoom(), &ZoomState::new(Some(2010), 20));
    }

    #[test]
    fn apply_zoom_without_center_is_noop() {
        let mut c = controller();
        c.set_year_from(Some(1900));
        assert_eq!(c.apply_zoom(), None);
        assert_eq!(c.state().year_from, Some(1900));
        assert_eq!(c.state().year_to, None);
    }

    #[test]
    fn clearing_center_drops_pending_and_applied_zoom() {
        let mut c = controller();
        c.set_zoom_center(Some(1950));
        c.apply_zoom();
        c.set_zoom_window(30);
        assert!(c.has_unapplied_zoom());

        c.set_zoom_center(None);
        assert!(!c.has_unapplied_zoom());
        assert_eq!(c.applied_zoom(), &ZoomState::initial(10));
    }

    #[test]
    fn reset_zoom_clears_year_dimension() {
        let mut c = controller();
        c.set_zoom_center(Some(1950));
        c.apply_zoom();
        c.reset_zoom();
        assert_eq!((c.state().year_from, c.state().year_to), (None, None));
        assert_eq!(c.state().zoom, ZoomState::initial(10));
        assert!(!c.has_unapplied_zoom());
    }

    #[test]
    fn presets() {
        let mut c = controller();
        let (from, to) = YearPreset::Last(50).resolve(c.dataset_bounds());
        c.apply_year_preset(from, to);
        assert_eq!((c.state().year_from, c.state().year_to), (Some(1970), Some(2019)));

        let (from, to) = YearPreset::All.resolve(c.dataset_bounds());
        c.apply_year_preset(from, to);
        assert_eq!((c.state().year_from, c.state().year_to), (None, None));

        assert_eq!(
            YearPreset::Last(500).resolve(c.dataset_bounds()),
            (Some(1859), Some(2019))
        );
    }

    #[test]
    fn active_filters_and_selection_order() {
        let mut c = controller();
        assert!(!c.has_active_filters());
        c.toggle_station("b");
        c.toggle_station("a");
        assert!(c.has_active_filters());
        assert_eq!(c.query().stations, vec!["b", "a"]);
        c.toggle_station("b");
        assert_eq!(c.query().stations, vec!["a"]);
        c.toggle_station("a");
        assert!(!c.has_active_filters());
        c.set_mode(DataMode::Annual);
        assert!(c.has_active_filters());
    }

    #[test]
    fn default_selection_is_not_a_filter() {
        let mut c = controller();
        c.set_default_stations(["10381".to_string()]);
        assert_eq!(c.query().stations, vec!["10381"]);
        assert!(!c.has_active_filters());

        c.toggle_station("10147");
        c.set_year_from(Some(1950));
        assert!(c.has_active_filters());

        c.clear();
        assert_eq!(c.query().stations, vec!["10381"]);
        assert_eq!(c.state().year_from, None);
        assert!(!c.has_active_filters());
    }
}
