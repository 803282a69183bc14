// In: src/pipeline/stages.rs

//! The relational stages a pipeline can chain, and the kernels that run them.
//!
//! Each kernel is a pure function `Table -> Result<Table>`. None of them look at
//! anything but their input, which is what makes a whole pipeline deterministic.

use std::fmt;

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, AsArray, BooleanArray, Float64Array, Int64Array,
    PrimitiveArray,
};
use arrow::compute::kernels::cmp::gt;
use arrow::compute::kernels::numeric::mul;
use arrow::compute::{and, cast_with_options, filter_record_batch, is_not_null, CastOptions};
use arrow::datatypes::{DataType, Float32Type, Float64Type};
use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::error::TrimframeError;
use crate::table::Table;

/// A literal operand for a comparison stage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One step of a transformation pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", content = "params")]
pub enum Stage {
    /// Removes every row holding a null (or a float NaN) in any column.
    DropNulls,
    /// Appends (or replaces) `output = left * right`, computed row-wise.
    WithProduct {
        output: String,
        left: String,
        right: String,
    },
    /// Keeps rows where `column > value` (strict).
    FilterGt { column: String, value: Literal },
}

impl Stage {
    /// Stable, human-readable name used in logs and `PipelineError`s.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::DropNulls => "drop_nulls",
            Stage::WithProduct { .. } => "with_product",
            Stage::FilterGt { .. } => "filter_gt",
        }
    }

    pub(crate) fn apply(&self, table: Table) -> Result<Table, TrimframeError> {
        match self {
            Stage::DropNulls => drop_nulls(table),
            Stage::WithProduct {
                output,
                left,
                right,
            } => with_product(table, output, left, right),
            Stage::FilterGt { column, value } => filter_gt(table, column, *value),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::DropNulls => write!(f, "drop_nulls()"),
            Stage::WithProduct {
                output,
                left,
                right,
            } => write!(f, "with_product({} = {} * {})", output, left, right),
            Stage::FilterGt { column, value } => write!(f, "filter_gt({} > {})", column, value),
        }
    }
}

//==================================================================================
// Arithmetic classification
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericClass {
    Integer,
    Float,
}

fn numeric_class(data_type: &DataType) -> Option<NumericClass> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Some(NumericClass::Integer),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => Some(NumericClass::Float),
        _ => None,
    }
}

/// Looks up a column that must exist and be numeric.
fn numeric_column<'a>(
    table: &'a Table,
    name: &str,
    stage: &str,
) -> Result<(&'a ArrayRef, NumericClass), TrimframeError> {
    let array = table.column_by_name(name).ok_or_else(|| {
        TrimframeError::SchemaError(format!(
            "{} requires column '{}', which is missing (columns: {:?})",
            stage,
            name,
            table.column_names()
        ))
    })?;
    let class = numeric_class(array.data_type()).ok_or_else(|| {
        TrimframeError::SchemaError(format!(
            "{} requires column '{}' to be numeric, got {:?}",
            stage,
            name,
            array.data_type()
        ))
    })?;
    Ok((array, class))
}

/// Casts without silently turning out-of-range values into nulls.
fn strict_cast(array: &ArrayRef, to: &DataType) -> Result<ArrayRef, TrimframeError> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    Ok(cast_with_options(array, to, &options)?)
}

//==================================================================================
// Kernels
//==================================================================================

/// Rows to keep for one column: `false` where the value is null or a float NaN.
/// `None` when the column has nothing to drop.
fn present_mask(column: &ArrayRef) -> Result<Option<BooleanArray>, TrimframeError> {
    fn not_nan<T>(array: &PrimitiveArray<T>) -> Option<BooleanArray>
    where
        T: ArrowPrimitiveType,
        T::Native: Float,
    {
        if !array.iter().any(|v| v.map_or(true, |x| x.is_nan())) {
            return None;
        }
        Some(
            array
                .iter()
                .map(|v| Some(v.is_some_and(|x| !x.is_nan())))
                .collect(),
        )
    }

    match column.data_type() {
        DataType::Float32 => Ok(not_nan(column.as_primitive::<Float32Type>())),
        DataType::Float64 => Ok(not_nan(column.as_primitive::<Float64Type>())),
        _ if column.logical_nulls().is_none() => Ok(None),
        _ => Ok(Some(is_not_null(column.as_ref())?)),
    }
}

pub(crate) fn drop_nulls(table: Table) -> Result<Table, TrimframeError> {
    let mut keep: Option<BooleanArray> = None;
    for column in table.columns() {
        let Some(present) = present_mask(column)? else {
            continue;
        };
        keep = Some(match keep {
            Some(acc) => and(&acc, &present)?,
            None => present,
        });
    }
    match keep {
        Some(mask) => Ok(Table::new(filter_record_batch(table.record_batch(), &mask)?)),
        None => Ok(table),
    }
}

pub(crate) fn with_product(
    table: Table,
    output: &str,
    left: &str,
    right: &str,
) -> Result<Table, TrimframeError> {
    let (lhs, lhs_class) = numeric_column(&table, left, "with_product")?;
    let (rhs, rhs_class) = numeric_column(&table, right, "with_product")?;

    let target = if lhs_class == NumericClass::Integer && rhs_class == NumericClass::Integer {
        DataType::Int64
    } else {
        DataType::Float64
    };
    let lhs = strict_cast(lhs, &target)?;
    let rhs = strict_cast(rhs, &target)?;
    // `mul` is overflow-checked for integers.
    let product = mul(&lhs, &rhs)?;

    table.with_column(output, product)
}

pub(crate) fn filter_gt(table: Table, column: &str, value: Literal) -> Result<Table, TrimframeError> {
    let (array, class) = numeric_column(&table, column, "filter_gt")?;

    let mask = match (class, value) {
        (NumericClass::Integer, Literal::Int(v)) => {
            let lhs = strict_cast(array, &DataType::Int64)?;
            gt(&lhs, &Int64Array::new_scalar(v))?
        }
        (_, literal) => {
            let threshold = match literal {
                Literal::Int(v) => v as f64,
                Literal::Float(v) => v,
            };
            let lhs = strict_cast(array, &DataType::Float64)?;
            gt(&lhs, &Float64Array::new_scalar(threshold))?
        }
    };

    let filtered = filter_record_batch(table.record_batch(), &mask)?;
    Ok(Table::new(filtered))
}
