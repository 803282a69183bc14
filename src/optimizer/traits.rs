// In: src/optimizer/traits.rs

//! Defines the behavioral contract for per-column optimization strategies.
//!
//! The optimizer classifies every column with a `ColumnKind` and asks each
//! registered strategy whether it handles that kind. A strategy is one
//! capability (integer narrowing, float narrowing, text cardinality) and
//! nothing else, so adding a new representation never touches the dispatch loop.

use arrow::array::ArrayRef;

use crate::error::TrimframeError;
use crate::types::ColumnKind;

/// **CONTRACT:** A single storage-shrinking capability.
///
/// `rewrite` must preserve the logical value of every cell (floats: within the
/// strategy's documented tolerance) and must never widen a column. Returning
/// `Ok(None)` means "already minimal, leave the column untouched".
pub trait ColumnStrategy: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    fn handles(&self, kind: ColumnKind) -> bool;

    fn rewrite(&self, array: &ArrayRef) -> Result<Option<ArrayRef>, TrimframeError>;
}
