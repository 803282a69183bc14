//! The `TypeOptimizer`: shrinks a `Table`'s memory footprint without changing
//! the logical value of any cell.
//!
//! Every column is classified with a `ColumnKind` and handed to the first
//! registered `ColumnStrategy` that handles that kind:
//!
//! | kind        | strategy            | rewrite                                  |
//! |-------------|---------------------|------------------------------------------|
//! | SignedInt   | `IntegerNarrowing`  | smallest of Int8/16/32/64 spanning range |
//! | Float       | `FloatNarrowing`    | Float64 -> Float32 within tolerance      |
//! | Text        | `TextCardinality`   | dictionary when distinct/rows < threshold|
//! | Categorical | none                | untouched                                |
//! | Other       | none                | untouched                                |
//!
//! Running the optimizer on its own output is a no-op: every rewrite lands on a
//! kind that is either already minimal or not handled at all.

use std::fmt;

use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::TrimframeError;
use crate::table::{column_footprint, Table};
use crate::types::ColumnKind;

//==================================================================================
// 1. Module Declarations
//==================================================================================

mod profiler;
mod strategies;
mod traits;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use self::strategies::{FloatNarrowing, IntegerNarrowing, TextCardinality};
pub use self::traits::ColumnStrategy;

/// What the optimizer did to one column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDecision {
    pub column: String,
    pub before: ColumnKind,
    pub after: ColumnKind,
    /// Name of the strategy that rewrote the column, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

/// Before/after footprint of a whole `optimize` call, plus the per-column log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OptimizationReport {
    pub num_rows: usize,
    pub bytes_before: usize,
    pub bytes_after: usize,
    pub columns: Vec<ColumnDecision>,
    /// Schema of the optimized table.
    pub schema: Schema,
}

impl OptimizationReport {
    pub fn bytes_saved(&self) -> usize {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

pub struct TypeOptimizer {
    config: OptimizerConfig,
    strategies: Vec<Box<dyn ColumnStrategy>>,
}

impl fmt::Debug for TypeOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("TypeOptimizer")
            .field("config", &self.config)
            .field("strategies", &names)
            .finish()
    }
}

impl Default for TypeOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl TypeOptimizer {
    /// Builds the optimizer with the standard strategy set for `config`.
    pub fn new(config: OptimizerConfig) -> Self {
        let mut strategies: Vec<Box<dyn ColumnStrategy>> = vec![Box::new(IntegerNarrowing)];
        if config.downcast_floats {
            strategies.push(Box::new(FloatNarrowing::new(config.float_tolerance)));
        }
        strategies.push(Box::new(TextCardinality::new(config.categorical_threshold)));
        Self { config, strategies }
    }

    /// Builds an optimizer from an explicit strategy list, tried in order.
    pub fn with_strategies(config: OptimizerConfig, strategies: Vec<Box<dyn ColumnStrategy>>) -> Self {
        Self { config, strategies }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Rewrites every column to its smallest value-preserving representation.
    pub fn optimize(&self, table: Table) -> Result<Table, TrimframeError> {
        self.optimize_with_report(table).map(|(table, _)| table)
    }

    /// Same as `optimize`, also returning what changed and the footprint delta.
    pub fn optimize_with_report(
        &self,
        table: Table,
    ) -> Result<(Table, OptimizationReport), TrimframeError> {
        let bytes_before = table.memory_footprint();
        let num_rows = table.num_rows();
        let names = table.column_names();
        let mut decisions = Vec::with_capacity(names.len());
        let mut table = table;

        for (idx, name) in names.into_iter().enumerate() {
            let array = table.column(idx).clone();
            let before = ColumnKind::from_arrow_type(array.data_type());
            let column_bytes_before = column_footprint(array.as_ref());

            let mut decision = ColumnDecision {
                column: name,
                before,
                after: before,
                strategy: None,
                bytes_before: column_bytes_before,
                bytes_after: column_bytes_before,
            };

            if let Some(strategy) = self.strategies.iter().find(|s| s.handles(before)) {
                if let Some(rewritten) = strategy.rewrite(&array)? {
                    decision.after = ColumnKind::from_arrow_type(rewritten.data_type());
                    decision.bytes_after = column_footprint(rewritten.as_ref());
                    decision.strategy = Some(strategy.name().to_string());
                    table = table.replace_column(idx, rewritten)?;
                }
            }

            log::debug!(
                "column '{}': {} -> {} ({} -> {} bytes)",
                decision.column,
                decision.before,
                decision.after,
                decision.bytes_before,
                decision.bytes_after
            );
            decisions.push(decision);
        }

        let bytes_after = table.memory_footprint();
        log::info!(
            "Memory usage reduced from {:.4} KB to {:.4} KB",
            bytes_before as f64 / 1024.0,
            bytes_after as f64 / 1024.0
        );

        let report = OptimizationReport {
            num_rows,
            bytes_before,
            bytes_after,
            columns: decisions,
            schema: table.schema().as_ref().clone(),
        };
        Ok((table, report))
    }
}

/// Optimizes `table` with the default configuration.
pub fn optimize(table: Table) -> Result<Table, TrimframeError> {
    TypeOptimizer::default().optimize(table)
}
