//! Runs a list of stages over a table, strictly in order.
//!
//! This is the only place stages are executed, so it is also where stage
//! failures get their context attached.

use std::time::Instant;

use super::stages::Stage;
use crate::error::TrimframeError;
use crate::table::Table;

pub(crate) fn execute_stages(stages: &[Stage], table: Table) -> Result<Table, TrimframeError> {
    let mut current = table;
    for stage in stages {
        let start = Instant::now();
        let rows_in = current.num_rows();
        current = stage.apply(current).map_err(|e| e.in_stage(stage.name()))?;
        log::debug!(
            "  - Stage: {:<40} | rows {} -> {} | {:.2?}",
            stage.to_string(),
            rows_in,
            current.num_rows(),
            start.elapsed()
        );
    }
    Ok(current)
}
