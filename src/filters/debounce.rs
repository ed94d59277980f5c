use std::time::{Duration, Instant};

use crate::data::model::YearBounds;

use super::controller::FilterController;
use super::validation::{self, PerField, ValidationResult, YearField};

// ---------------------------------------------------------------------------
// Per-field debounce state machine
// ---------------------------------------------------------------------------

/// Validation progress of one year input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Idle,
    /// Waiting for typing to pause; a new keystroke replaces the deadline.
    Pending { deadline: Instant, value: i32 },
    Settled(ValidationResult),
}

/// Messages currently displayed next to one year input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFeedback {
    pub error: Option<String>,
    pub warning: Option<String>,
}

/// Keeps the controller's year values in step with every keystroke while
/// holding back soft warnings until typing pauses.
///
/// Hard errors (negative or non-numeric input) are shown at once; warnings
/// and the from/to consistency message are computed when a field settles.
#[derive(Debug)]
pub struct DebouncedInputCoordinator {
    delay: Duration,
    states: PerField<DebounceState>,
    feedback: PerField<FieldFeedback>,
    range_error: Option<String>,
}

impl DebouncedInputCoordinator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            states: PerField::default(),
            feedback: PerField::default(),
            range_error: None,
        }
    }

    pub fn state(&self, field: YearField) -> &DebounceState {
        &self.states[field]
    }

    pub fn feedback(&self, field: YearField) -> &FieldFeedback {
        &self.feedback[field]
    }

    /// The "start year is after end year" message, if shown.
    pub fn range_error(&self) -> Option<&str> {
        self.range_error.as_deref()
    }

    /// Handle a keystroke in one year input.
    pub fn on_input(
        &mut self,
        field: YearField,
        raw: &str,
        now: Instant,
        controller: &mut FilterController,
    ) {
        let raw = raw.trim();

        if raw.is_empty() {
            controller.set_year(field, None);
            self.states[field] = DebounceState::Idle;
            self.feedback[field] = FieldFeedback::default();
            self.range_error = None;
            return;
        }

        let Ok(value) = raw.parse::<i32>() else {
            self.states[field] = DebounceState::Idle;
            self.feedback[field] = FieldFeedback {
                error: Some(format!("{field} must be a whole number")),
                warning: None,
            };
            return;
        };

        controller.set_year(field, Some(value));

        if value < 0 {
            // Hard errors skip the debounce; bounds are irrelevant for them.
            let result = validation::validate_year(Some(value), field, YearBounds::new(0, 0));
            self.feedback[field] = FieldFeedback {
                error: result.error.clone(),
                warning: None,
            };
            self.range_error = None;
            self.states[field] = DebounceState::Settled(result);
            return;
        }

        // Messages about the previous value no longer apply.
        self.feedback[field] = FieldFeedback::default();
        self.range_error = None;
        self.states[field] = DebounceState::Pending {
            deadline: now + self.delay,
            value,
        };
    }

    /// Settle every field whose deadline has passed.
    ///
    /// Returns one `(field, result)` per evaluation performed.
    pub fn poll(
        &mut self,
        now: Instant,
        controller: &FilterController,
        plausible: YearBounds,
    ) -> Vec<(YearField, ValidationResult)> {
        let mut settled = Vec::new();

        for field in YearField::ALL {
            let DebounceState::Pending { deadline, value } = self.states[field] else {
                continue;
            };
            if now < deadline {
                continue;
            }

            let result = validation::validate_year(Some(value), field, plausible);
            log::debug!("{field} settled at {value}: {result:?}");
            self.feedback[field] = FieldFeedback {
                error: result.error.clone(),
                warning: result.warning.clone(),
            };
            self.states[field] = DebounceState::Settled(result.clone());
            settled.push((field, result));
        }

        if !settled.is_empty() {
            let range = validation::validate_year_range(
                controller.year(YearField::From),
                controller.year(YearField::To),
            );
            self.range_error = range.message;
        }

        settled
    }

    /// Earliest pending deadline, for scheduling the next poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        YearField::ALL
            .iter()
            .filter_map(|&f| match self.states[f] {
                DebounceState::Pending { deadline, .. } => Some(deadline),
                _ => None,
            })
            .min()
    }

    /// Drop every pending evaluation.
    pub fn cancel_all(&mut self) {
        for field in YearField::ALL {
            if matches!(self.states[field], DebounceState::Pending { .. }) {
                self.states[field] = DebounceState::Idle;
            }
        }
    }

    /// Forget all messages, e.g. after the year range was set programmatically.
    pub fn reset(&mut self) {
        self.states = PerField::default();
        self.feedback = PerField::default();
        self.range_error = None;
    }
}

impl Drop for DebouncedInputCoordinator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
