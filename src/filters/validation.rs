use std::fmt;

use crate::data::model::YearBounds;

/// Which of the two year inputs a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearField {
    From,
    To,
}

impl YearField {
    pub const ALL: [YearField; 2] = [YearField::From, YearField::To];

    fn index(self) -> usize {
        match self {
            YearField::From => 0,
            YearField::To => 1,
        }
    }
}

impl fmt::Display for YearField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearField::From => f.write_str("Start year"),
            YearField::To => f.write_str("End year"),
        }
    }
}

/// A pair of values indexed by [`YearField`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerField<T>([T; 2]);

impl<T> std::ops::Index<YearField> for PerField<T> {
    type Output = T;
    fn index(&self, field: YearField) -> &T {
        &self.0[field.index()]
    }
}

impl<T> std::ops::IndexMut<YearField> for PerField<T> {
    fn index_mut(&mut self, field: YearField) -> &mut T {
        &mut self.0[field.index()]
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of checking a single year value.
///
/// `error` is set iff `is_valid` is false. A warning never makes a value
/// invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
            warning: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            is_valid: false,
            error: Some(message),
            warning: None,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            is_valid: true,
            error: None,
            warning: Some(message),
        }
    }
}

/// Cross-field consistency of the year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeValidation {
    pub is_valid: bool,
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Check one year value.
///
/// Negative years are errors; years outside `plausible` only warn.
pub fn validate_year(value: Option<i32>, role: YearField, plausible: YearBounds) -> ValidationResult {
    let Some(year) = value else {
        return ValidationResult::ok();
    };

    if year < 0 {
        return ValidationResult::error(format!("{role} cannot be negative"));
    }
    if plausible.contains(year) {
        return ValidationResult::ok();
    }
    if year < plausible.min {
        ValidationResult::warning(format!(
            "{role} {year} is before the earliest data ({})",
            plausible.min
        ))
    } else {
        ValidationResult::warning(format!(
            "{role} {year} is after the latest data ({})",
            plausible.max
        ))
    }
}

/// A range is invalid only when both bounds are present and `from > to`.
pub fn validate_year_range(from: Option<i32>, to: Option<i32>) -> RangeValidation {
    match (from, to) {
        (Some(from), Some(to)) if from > to => RangeValidation {
            is_valid: false,
            message: Some(format!("Start year {from} is after end year {to}")),
        },
        _ => RangeValidation {
            is_valid: true,
            message: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: YearBounds = YearBounds { min: 1859, max: 2019 };

    #[test]
    fn absent_is_valid() {
        assert_eq!(validate_year(None, YearField::From, DATA), ValidationResult::ok());
    }

    #[test]
    fn negative_is_error() {
        let r = validate_year(Some(-5), YearField::To, DATA);
        assert!(!r.is_valid);
        assert_eq!(r.error.as_deref(), Some("End year cannot be negative"));
        assert!(r.warning.is_none());
    }

    #[test]
    fn out_of_data_range_only_warns() {
        let early = validate_year(Some(1700), YearField::From, DATA);
        assert!(early.is_valid);
        assert!(early.warning.unwrap().contains("earliest"));

        let late = validate_year(Some(2050), YearField::To, DATA);
        assert!(late.is_valid);
        assert!(late.warning.unwrap().contains("latest"));

        assert_eq!(validate_year(Some(0), YearField::From, DATA).error, None);
        assert_eq!(validate_year(Some(1859), YearField::From, DATA), ValidationResult::ok());
    }

    #[test]
    fn range_invalid_only_when_inverted() {
        assert!(validate_year_range(Some(2000), Some(2000)).is_valid);
        assert!(validate_year_range(Some(2001), None).is_valid);
        assert!(validate_year_range(None, Some(1900)).is_valid);
        let bad = validate_year_range(Some(2001), Some(2000));
        assert!(!bad.is_valid);
        assert!(bad.message.is_some());
    }
}
