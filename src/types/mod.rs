//! This module defines the core, strongly-typed column classification used
//! throughout trimframe.
//!
//! It currently includes the canonical `ColumnKind` enum, which folds the many
//! Arrow `DataType`s into the handful of categories the optimizer and the
//! pipeline dispatch on, plus the width enums for the narrowable kinds.

pub mod column_kind;

// Re-export the main type(s) for easier access.
pub use column_kind::{ColumnKind, FloatWidth, IntWidth};
