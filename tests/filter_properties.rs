use std::time::{Duration, Instant};

use climate_explorer::data::model::{DataMode, YearBounds};
use climate_explorer::filters::controller::FilterController;
use climate_explorer::filters::debounce::{DebounceState, DebouncedInputCoordinator};
use climate_explorer::filters::validation::YearField;
use climate_explorer::filters::zoom::{MAX_WINDOW, MIN_WINDOW, WINDOW_STEP};
use proptest::prelude::*;

const BOUNDS: YearBounds = YearBounds { min: 1859, max: 2019 };

fn controller() -> FilterController {
    let mut c = FilterController::new(10);
    c.set_dataset_bounds(Some(BOUNDS));
    c
}

proptest! {
    #[test]
    fn applied_zoom_is_clamped_to_dataset(center in 1700i32..2200, window in 0u32..80) {
        let mut c = controller();
        c.set_zoom_center(Some(center));
        c.set_zoom_window(window);
        let w = c.state().zoom.window_size() as i32;
        prop_assert!(w >= MIN_WINDOW as i32 && w <= MAX_WINDOW as i32);
        prop_assert_eq!(w as u32 % WINDOW_STEP, 0);

        let (from, to) = c.apply_zoom().unwrap();
        prop_assert_eq!(from, (center - w).max(BOUNDS.min));
        prop_assert_eq!(to, (center + w).min(BOUNDS.max));
        prop_assert_eq!(c.state().year_from, Some(from));
        prop_assert_eq!(c.state().year_to, Some(to));
        prop_assert!(!c.has_unapplied_zoom());
    }

    #[test]
    fn clearing_center_drops_pending_zoom(center in 1859i32..2019, window in 5u32..=50) {
        let mut c = controller();
        c.set_zoom_center(Some(center));
        c.set_zoom_window(window);
        prop_assert!(c.has_unapplied_zoom());
        c.set_zoom_center(None);
        prop_assert!(!c.has_unapplied_zoom());
        prop_assert_eq!(c.applied_zoom().center_year(), None);
    }

    #[test]
    fn sigma_never_survives_monthly(toggles in proptest::collection::vec(any::<bool>(), 1..20)) {
        let mut c = controller();
        for annual in toggles {
            let mode = if annual { DataMode::Annual } else { DataMode::Monthly };
            c.set_mode(mode);
            let _ = c.set_show_sigma_bounds(true);
            if mode == DataMode::Monthly {
                prop_assert!(!c.state().show_sigma_bounds);
            }
        }
    }

    #[test]
    fn only_the_last_keystroke_settles(keys in proptest::collection::vec(1860i32..2019, 1..12)) {
        let mut c = controller();
        let mut debounce = DebouncedInputCoordinator::new(Duration::from_millis(800));
        let start = Instant::now();
        let mut now = start;
        for year in &keys {
            debounce.on_input(YearField::From, &year.to_string(), now, &mut c);
            now += Duration::from_millis(100);
            prop_assert!(debounce.poll(now, &c, BOUNDS).is_empty());
        }

        let settled = debounce.poll(now + Duration::from_millis(800), &c, BOUNDS);
        prop_assert_eq!(settled.len(), 1);
        prop_assert_eq!(c.state().year_from, keys.last().copied());
        prop_assert!(matches!(debounce.state(YearField::From), DebounceState::Settled(_)));
    }
}

#[test]
fn zoom_apply_then_reset_restores_year_filter() {
    let mut c = controller();
    c.set_zoom_center(Some(2015));
    c.set_zoom_window(10);
    assert_eq!(c.apply_zoom(), Some((2005, 2019)));

    c.reset_zoom();
    assert_eq!(c.state().year_from, None);
    assert_eq!(c.state().year_to, None);
    assert_eq!(c.state().zoom.center_year(), None);
    assert!(!c.has_unapplied_zoom());
}
