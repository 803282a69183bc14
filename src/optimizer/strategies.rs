// In: src/optimizer/strategies.rs

//! The concrete `ColumnStrategy` implementations.

use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};

use super::profiler;
use super::traits::ColumnStrategy;
use crate::error::TrimframeError;
use crate::log_metric;
use crate::types::{ColumnKind, FloatWidth, IntWidth};

//==================================================================================
// --- Strategy 1: Integer Narrowing ---
//==================================================================================

/// Rewrites a signed integer column to the smallest signed width spanning its
/// observed range. A column without non-null values narrows to `Int8`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerNarrowing;

impl ColumnStrategy for IntegerNarrowing {
    fn name(&self) -> &'static str {
        "integer_narrowing"
    }

    fn handles(&self, kind: ColumnKind) -> bool {
        kind.is_signed_int()
    }

    fn rewrite(&self, array: &ArrayRef) -> Result<Option<ArrayRef>, TrimframeError> {
        let ColumnKind::SignedInt(current) = ColumnKind::from_arrow_type(array.data_type()) else {
            return Ok(None);
        };
        let target = match profiler::signed_range(array.as_ref())? {
            Some((lo, hi)) => IntWidth::smallest_spanning(lo, hi).ok_or_else(|| {
                TrimframeError::InternalError(format!(
                    "No signed width spans [{}, {}] although it came from a signed column",
                    lo, hi
                ))
            })?,
            None => IntWidth::W8,
        };
        if target >= current {
            return Ok(None);
        }
        log_metric!(
            "event" = "narrow_int",
            "from" = ColumnKind::SignedInt(current),
            "to" = ColumnKind::SignedInt(target)
        );
        Ok(Some(cast(array, &target.to_arrow_type())?))
    }
}

//==================================================================================
// --- Strategy 2: Float Narrowing ---
//==================================================================================

/// Narrows `Float64` columns to `Float32` when every value round-trips within
/// `tolerance`. The narrowing is lossy by definition; the tolerance bounds it.
#[derive(Debug, Clone, Copy)]
pub struct FloatNarrowing {
    tolerance: f64,
}

impl FloatNarrowing {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl ColumnStrategy for FloatNarrowing {
    fn name(&self) -> &'static str {
        "float_narrowing"
    }

    fn handles(&self, kind: ColumnKind) -> bool {
        kind.is_float()
    }

    fn rewrite(&self, array: &ArrayRef) -> Result<Option<ArrayRef>, TrimframeError> {
        // Float32 is the narrowest supported width, so only Float64 is a candidate.
        if array.data_type() != &DataType::Float64 {
            return Ok(None);
        }
        let fit = profiler::float32_fit(array.as_primitive::<Float64Type>(), self.tolerance);
        log_metric!(
            "event" = "narrow_float",
            "fits" = fit.fits,
            "max_abs_error" = fit.max_abs_error
        );
        if !fit.fits {
            return Ok(None);
        }
        Ok(Some(cast(array, &FloatWidth::W32.to_arrow_type())?))
    }
}

//==================================================================================
// --- Strategy 3: Text Cardinality ---
//==================================================================================

/// Dictionary-encodes a text column whose cardinality ratio is strictly below
/// `threshold`. Empty columns are never candidates.
#[derive(Debug, Clone, Copy)]
pub struct TextCardinality {
    threshold: f64,
}

impl TextCardinality {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl ColumnStrategy for TextCardinality {
    fn name(&self) -> &'static str {
        "text_cardinality"
    }

    fn handles(&self, kind: ColumnKind) -> bool {
        kind == ColumnKind::Text
    }

    fn rewrite(&self, array: &ArrayRef) -> Result<Option<ArrayRef>, TrimframeError> {
        let Some(profiler::Cardinality { distinct, ratio }) = profiler::cardinality(array.as_ref())?
        else {
            return Ok(None);
        };
        log_metric!(
            "event" = "text_cardinality",
            "ratio" = ratio,
            "threshold" = self.threshold
        );
        if ratio >= self.threshold {
            return Ok(None);
        }
        let key = IntWidth::smallest_for_count(distinct).ok_or_else(|| {
            TrimframeError::InternalError(format!("No key width can index {} values", distinct))
        })?;
        let dictionary_type = DataType::Dictionary(
            Box::new(key.to_arrow_type()),
            Box::new(array.data_type().clone()),
        );
        Ok(Some(cast(array, &dictionary_type)?))
    }
}
