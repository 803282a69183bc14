// In: src/bridge/sink.rs

//! Sinks: persist `Table`s.

use std::fs::File;
use std::path::Path;

use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::source::read_csv;
use crate::config::ParquetSinkConfig;
use crate::error::TrimframeError;
use crate::optimizer::{OptimizationReport, TypeOptimizer};
use crate::table::Table;

fn writer_properties(config: &ParquetSinkConfig) -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(config.max_row_group_size)
        .build()
}

/// Writes `table` to `path` as a Snappy-compressed Parquet file.
///
/// The Arrow schema is embedded in the file metadata, so narrowed integer
/// widths and categorical columns come back unchanged from `read_parquet`.
pub fn write_parquet(
    table: &Table,
    path: impl AsRef<Path>,
    config: &ParquetSinkConfig,
) -> Result<(), TrimframeError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, table.schema(), Some(writer_properties(config)))?;
    writer.write(table.record_batch())?;
    let metadata = writer.close()?;

    log::debug!(
        "wrote {} rows in {} row group(s) to {}",
        metadata.num_rows,
        metadata.row_groups.len(),
        path.display()
    );
    Ok(())
}

/// Reads a CSV file, optimizes its column types and writes it back out as Parquet.
pub fn convert_csv_to_parquet(
    csv_path: impl AsRef<Path>,
    parquet_path: impl AsRef<Path>,
    optimizer: &TypeOptimizer,
    config: &ParquetSinkConfig,
) -> Result<OptimizationReport, TrimframeError> {
    let table = read_csv(csv_path)?;
    let (table, report) = optimizer.optimize_with_report(table)?;
    write_parquet(&table, parquet_path, config)?;
    Ok(report)
}
