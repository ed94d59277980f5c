use crate::data::model::YearBounds;

pub const MIN_WINDOW: u32 = 5;
pub const MAX_WINDOW: u32 = 50;
pub const WINDOW_STEP: u32 = 5;

/// Clamp a window size into `[MIN_WINDOW, MAX_WINDOW]` and round it to the
/// nearest step.
pub fn snap_window(size: u32) -> u32 {
    let clamped = size.clamp(MIN_WINDOW, MAX_WINDOW);
    let snapped = (clamped + WINDOW_STEP / 2) / WINDOW_STEP * WINDOW_STEP;
    snapped.clamp(MIN_WINDOW, MAX_WINDOW)
}

// ---------------------------------------------------------------------------
// Zoom window
// ---------------------------------------------------------------------------

/// A symmetric year window `[center - window, center + window]`.
///
/// The window size is only actionable while a center year is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomState {
    center_year: Option<i32>,
    window_size: u32,
}

impl ZoomState {
    pub fn new(center_year: Option<i32>, window_size: u32) -> Self {
        Self {
            center_year,
            window_size: snap_window(window_size),
        }
    }

    /// No center year, the given default window.
    pub fn initial(default_window: u32) -> Self {
        Self::new(None, default_window)
    }

    pub fn center_year(&self) -> Option<i32> {
        self.center_year
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// The year range this zoom commits to, clamped to `bounds` when known.
    ///
    /// `None` without a center year.
    pub fn range(&self, bounds: Option<YearBounds>) -> Option<(i32, i32)> {
        let center = self.center_year?;
        let half = self.window_size as i32;
        let (mut from, mut to) = (center.saturating_sub(half), center.saturating_add(half));
        if let Some(b) = bounds {
            from = from.max(b.min);
            to = to.min(b.max);
        }
        Some((from, to))
    }
}

/// Whether the displayed zoom differs from the last one committed.
///
/// Only a zoom with a center year can be pending.
pub fn has_unapplied(current: &ZoomState, applied: &ZoomState) -> bool {
    current.center_year.is_some()
        && (current.center_year, current.window_size) != (applied.center_year, applied.window_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_snapped_and_clamped() {
        assert_eq!(snap_window(0), 5);
        assert_eq!(snap_window(12), 10);
        assert_eq!(snap_window(13), 15);
        assert_eq!(snap_window(49), 50);
        assert_eq!(snap_window(500), 50);
        assert_eq!(ZoomState::new(Some(2000), 7).window_size(), 5);
    }

    #[test]
    fn range_clamps_to_dataset() {
        let bounds = Some(YearBounds::new(1859, 2019));
        assert_eq!(ZoomState::new(Some(2010), 20).range(bounds), Some((1990, 2019)));
        assert_eq!(ZoomState::new(Some(1860), 10).range(bounds), Some((1859, 1870)));
        assert_eq!(ZoomState::new(Some(1950), 10).range(None), Some((1940, 1960)));
        assert_eq!(ZoomState::new(None, 10).range(bounds), None);
    }

    #[test]
    fn unapplied_requires_center() {
        let applied = ZoomState::initial(10);
        assert!(!has_unapplied(&ZoomState::new(None, 30), &applied));
        assert!(has_unapplied(&ZoomState::new(Some(1900), 10), &applied));
        let same = ZoomState::new(Some(1900), 10);
        assert!(!has_unapplied(&same, &same));
    }
}
