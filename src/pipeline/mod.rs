//! The method-chaining `TransformationPipeline`.
//!
//! A `Pipeline` is an ordered list of `Stage`s. Building one never touches any
//! data; the stages only run when `collect` is called, in the order they were
//! chained. All errors, including `SchemaError`s for missing columns, therefore
//! surface at `collect` time and never while the chain is being assembled.
//!
//! ```
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array};
//! use trimframe::Table;
//!
//! let table = Table::from_columns(vec![
//!     ("price", Arc::new(Int64Array::from(vec![600, 800])) as ArrayRef),
//!     ("quantity", Arc::new(Int64Array::from(vec![2, 2])) as ArrayRef),
//! ])?;
//! let out = table
//!     .lazy()
//!     .drop_nulls()
//!     .with_product("total", "price", "quantity")
//!     .filter_gt("total", 1000_i64)
//!     .collect()?;
//! assert_eq!(out.num_rows(), 2);
//! # Ok::<(), trimframe::TrimframeError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TrimframeError;
use crate::table::Table;

mod executor;
mod stages;

pub use self::stages::{Literal, Stage};

/// Name of the column derived by the standard pipeline.
pub const TOTAL_COLUMN: &str = "total";
/// Rows whose `total` is not strictly above this are dropped by the standard pipeline.
pub const TOTAL_THRESHOLD: i64 = 1000;

/// An ordered, reusable chain of stages.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// drop nulls -> `total = price * quantity` -> `total > 1000`.
    pub fn standard() -> Self {
        Self::new()
            .drop_nulls()
            .with_product(TOTAL_COLUMN, "price", "quantity")
            .filter_gt(TOTAL_COLUMN, TOTAL_THRESHOLD)
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn drop_nulls(self) -> Self {
        self.stage(Stage::DropNulls)
    }

    pub fn with_product(self, output: &str, left: &str, right: &str) -> Self {
        self.stage(Stage::WithProduct {
            output: output.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        })
    }

    pub fn filter_gt(self, column: &str, value: impl Into<Literal>) -> Self {
        self.stage(Stage::FilterGt {
            column: column.to_string(),
            value: value.into(),
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage over `table`, in order.
    pub fn collect(&self, table: Table) -> Result<Table, TrimframeError> {
        executor::execute_stages(&self.stages, table)
    }
}

/// A table paired with a not-yet-executed pipeline.
#[derive(Debug, Clone)]
pub struct LazyTable {
    input: Table,
    pipeline: Pipeline,
}

impl LazyTable {
    pub fn drop_nulls(mut self) -> Self {
        self.pipeline = self.pipeline.drop_nulls();
        self
    }

    pub fn with_product(mut self, output: &str, left: &str, right: &str) -> Self {
        self.pipeline = self.pipeline.with_product(output, left, right);
        self
    }

    pub fn filter_gt(mut self, column: &str, value: impl Into<Literal>) -> Self {
        self.pipeline = self.pipeline.filter_gt(column, value);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Materializes the chain.
    pub fn collect(self) -> Result<Table, TrimframeError> {
        self.pipeline.collect(self.input)
    }
}

impl Table {
    /// Starts a lazy, method-chained transformation of this table.
    pub fn lazy(self) -> LazyTable {
        LazyTable {
            input: self,
            pipeline: Pipeline::new(),
        }
    }
}

/// Applies the standard pipeline: drop null rows, derive `total = price *
/// quantity`, keep `total > 1000`.
///
/// # Errors
/// `TrimframeError::SchemaError` if `price` or `quantity` is missing or not numeric.
pub fn transform(table: Table) -> Result<Table, TrimframeError> {
    Pipeline::standard().collect(table)
}

#[cfg(test)]
mod tests;
