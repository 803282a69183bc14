//! This file is the root of the `trimframe` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`optimizer`, `pipeline`,
//!     `bridge`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need, so that
//!     `use trimframe::{Table, TypeOptimizer, transform};` is enough for the
//!     common optimize-then-transform flow.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod observability;

pub mod bridge;
pub mod chunked;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod pipeline;
pub mod table;
pub mod types;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use config::{OptimizerConfig, ParquetSinkConfig, TrimframeConfig};
pub use error::TrimframeError;
pub use observability::init_logging;
pub use optimizer::{optimize, ColumnDecision, OptimizationReport, TypeOptimizer};
pub use pipeline::{transform, LazyTable, Literal, Pipeline, Stage};
pub use table::Table;
pub use types::ColumnKind;
