// In: src/optimizer/profiler.rs

//! Read-only column analysis feeding the narrowing strategies.
//!
//! Every function here inspects an Arrow array and reports a fact about its
//! values (integer range, float round-trip error, cardinality). None of them
//! allocate a new column; the strategies decide what to do with the answer.

use arrow::array::{Array, AsArray, Float64Array, GenericStringArray, OffsetSizeTrait, PrimitiveArray};
use arrow::compute::{max, min};
use arrow::datatypes::{ArrowNumericType, DataType, Int16Type, Int32Type, Int64Type, Int8Type};
use hashbrown::HashSet;
use num_traits::ToPrimitive;

use crate::error::TrimframeError;

//==================================================================================
// 1. Integer range
//==================================================================================

/// The `[min, max]` over the non-null values of a signed integer column, or
/// `None` if the column holds no non-null values.
pub(crate) fn signed_range(array: &dyn Array) -> Result<Option<(i64, i64)>, TrimframeError> {
    match array.data_type() {
        DataType::Int8 => Ok(range_of(array.as_primitive::<Int8Type>())),
        DataType::Int16 => Ok(range_of(array.as_primitive::<Int16Type>())),
        DataType::Int32 => Ok(range_of(array.as_primitive::<Int32Type>())),
        DataType::Int64 => Ok(range_of(array.as_primitive::<Int64Type>())),
        dt => Err(TrimframeError::UnsupportedType(format!(
            "Integer range requires a signed integer column, got {:?}",
            dt
        ))),
    }
}

fn range_of<T>(array: &PrimitiveArray<T>) -> Option<(i64, i64)>
where
    T: ArrowNumericType,
    T::Native: ToPrimitive,
{
    let lo = min(array)?.to_i64()?;
    let hi = max(array)?.to_i64()?;
    Some((lo, hi))
}

//==================================================================================
// 2. Float round trip
//==================================================================================

/// Outcome of probing whether a `Float64` column survives narrowing to `Float32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Float32Fit {
    pub fits: bool,
    /// Largest absolute error seen before the probe stopped.
    pub max_abs_error: f64,
}

/// Checks every non-null value for a `Float32` round trip within `tolerance`.
///
/// NaN and infinities round-trip as themselves. A finite value whose magnitude
/// exceeds `f32::MAX` never fits.
pub(crate) fn float32_fit(array: &Float64Array, tolerance: f64) -> Float32Fit {
    let mut max_abs_error = 0.0_f64;
    for value in array.iter().flatten() {
        if !value.is_finite() {
            continue;
        }
        let narrowed = value as f32;
        if narrowed.is_infinite() {
            return Float32Fit {
                fits: false,
                max_abs_error: f64::INFINITY,
            };
        }
        let error = (f64::from(narrowed) - value).abs();
        max_abs_error = max_abs_error.max(error);
        if error > tolerance {
            return Float32Fit {
                fits: false,
                max_abs_error,
            };
        }
    }
    Float32Fit {
        fits: true,
        max_abs_error,
    }
}

//==================================================================================
// 3. Cardinality
//==================================================================================

/// Number of distinct values in a text column. A null counts as one extra
/// distinct value when present.
pub(crate) fn distinct_count(array: &dyn Array) -> Result<usize, TrimframeError> {
    match array.data_type() {
        DataType::Utf8 => Ok(count_distinct_strings(array.as_string::<i32>())),
        DataType::LargeUtf8 => Ok(count_distinct_strings(array.as_string::<i64>())),
        dt => Err(TrimframeError::UnsupportedType(format!(
            "Cardinality requires a text column, got {:?}",
            dt
        ))),
    }
}

fn count_distinct_strings<O: OffsetSizeTrait>(array: &GenericStringArray<O>) -> usize {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut saw_null = false;
    for value in array.iter() {
        match value {
            Some(s) => {
                seen.insert(s);
            }
            None => saw_null = true,
        }
    }
    seen.len() + usize::from(saw_null)
}

/// Distinct count and `distinct / rows` of a text column, from one hashing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cardinality {
    pub distinct: usize,
    pub ratio: f64,
}

/// Profiles a text column's cardinality, or `None` for an empty column so the
/// caller never divides by zero.
pub(crate) fn cardinality(array: &dyn Array) -> Result<Option<Cardinality>, TrimframeError> {
    let rows = array.len();
    if rows == 0 {
        return Ok(None);
    }
    let distinct = distinct_count(array)?;
    Ok(Some(Cardinality {
        distinct,
        ratio: distinct as f64 / rows as f64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array, LargeStringArray, StringArray};

    #[test]
    fn test_signed_range_ignores_nulls() {
        let array = Int64Array::from(vec![Some(-50), None, Some(127), Some(3)]);
        assert_eq!(signed_range(&array).unwrap(), Some((-50, 127)));
    }

    #[test]
    fn test_signed_range_of_all_null_column() {
        let array = Int32Array::from(vec![None, None]);
        assert_eq!(signed_range(&array).unwrap(), None);
    }

    #[test]
    fn test_signed_range_rejects_text() {
        let array = StringArray::from(vec!["a"]);
        assert!(matches!(
            signed_range(&array),
            Err(TrimframeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_float32_fit_accepts_representable_values() {
        let array = Float64Array::from(vec![Some(1.5), None, Some(-2.25), Some(f64::NAN), Some(f64::INFINITY)]);
        let fit = float32_fit(&array, 5e-4);
        assert!(fit.fits);
        assert_eq!(fit.max_abs_error, 0.0);
    }

    #[test]
    fn test_float32_fit_rejects_large_rounding_error() {
        // 2^24 + 1 is the first integer f32 cannot represent; the error is exactly 1.
        let array = Float64Array::from(vec![16_777_217.0]);
        let fit = float32_fit(&array, 5e-4);
        assert!(!fit.fits);
        assert_eq!(fit.max_abs_error, 1.0);
    }

    #[test]
    fn test_float32_fit_rejects_overflow() {
        let array = Float64Array::from(vec![1e300]);
        assert!(!float32_fit(&array, 5e-4).fits);
    }

    #[test]
    fn test_distinct_count_counts_null_once() {
        let array = StringArray::from(vec![Some("a"), None, Some("a"), None, Some("b")]);
        assert_eq!(distinct_count(&array).unwrap(), 3);
    }

    #[test]
    fn test_cardinality_handles_large_utf8() {
        let array = LargeStringArray::from(vec!["x", "x", "y", "y"]);
        assert_eq!(
            cardinality(&array).unwrap(),
            Some(Cardinality {
                distinct: 2,
                ratio: 0.5
            })
        );
    }

    #[test]
    fn test_cardinality_of_empty_column_is_none() {
        let array = StringArray::from(Vec::<&str>::new());
        assert_eq!(cardinality(&array).unwrap(), None);
    }
}
