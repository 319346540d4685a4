//! Per-feature values that may be undefined

use crate::error::MeasureError;
use serde::{Serialize, Serializer};

/// A single acoustic measure: either a computed value or the reason it is missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Defined(f64),
    Undefined(MeasureError),
}

impl Measure {
    /// The value, if defined
    pub fn value(&self) -> Option<f64> {
        match self {
            Measure::Defined(v) => Some(*v),
            Measure::Undefined(_) => None,
        }
    }

    /// Whether a value was computed
    pub fn is_defined(&self) -> bool {
        matches!(self, Measure::Defined(_))
    }

    /// Reason the measure is missing, if undefined
    pub fn reason(&self) -> Option<MeasureError> {
        match self {
            Measure::Defined(_) => None,
            Measure::Undefined(reason) => Some(*reason),
        }
    }

    /// Apply `f` to a defined value
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Measure::Defined(v) => Measure::Defined(f(v)),
            undefined => undefined,
        }
    }
}

impl From<Result<f64, MeasureError>> for Measure {
    fn from(result: Result<f64, MeasureError>) -> Self {
        match result {
            Ok(v) if v.is_finite() => Measure::Defined(v),
            Ok(_) => Measure::Undefined(MeasureError::NumericalDegeneracy("non-finite result")),
            Err(e) => Measure::Undefined(e),
        }
    }
}

/// Undefined measures serialize as `null`
impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}
