// In: src/chunked/mod.rs

//! Caller-level fan-out over row chunks.
//!
//! The optimizer and the pipeline are single-threaded. This module splits a
//! table (or a CSV stream) into row chunks, runs one closure per chunk on the
//! rayon pool and stitches the results back together in the original chunk
//! order. Workers share nothing mutable; configuration crosses threads as
//! `Arc<TrimframeConfig>`.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::bridge::read_csv_chunks;
use crate::config::TrimframeConfig;
use crate::error::TrimframeError;
use crate::optimizer::TypeOptimizer;
use crate::pipeline::Pipeline;
use crate::table::Table;

/// Applies `f` to every chunk in parallel. Output order matches input order.
pub fn map_chunks<F>(chunks: Vec<Table>, f: F) -> Result<Vec<Table>, TrimframeError>
where
    F: Fn(Table) -> Result<Table, TrimframeError> + Send + Sync,
{
    // `collect` into `Result<Vec<_>>` keeps indexed order and short-circuits on the first error.
    chunks.into_par_iter().map(f).collect()
}

/// Optimizes each chunk independently and in parallel.
///
/// Chunks may come back with different storage types (one `Int8`, another
/// `Int16`); `Table::concat` reconciles them.
pub fn optimize_chunks(
    chunks: Vec<Table>,
    optimizer: &TypeOptimizer,
) -> Result<Vec<Table>, TrimframeError> {
    map_chunks(chunks, |chunk| optimizer.optimize(chunk))
}

/// Splits `table` into `chunk_size`-row chunks, applies `f` to each in
/// parallel and concatenates the results in order.
///
/// A table with no rows is passed to `f` as-is so the output still carries
/// whatever columns `f` adds.
pub fn process_table_in_chunks<F>(
    table: Table,
    chunk_size: usize,
    f: F,
) -> Result<Table, TrimframeError>
where
    F: Fn(Table) -> Result<Table, TrimframeError> + Send + Sync,
{
    if chunk_size == 0 {
        return Err(TrimframeError::ConfigError(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if table.num_rows() == 0 {
        return f(table);
    }

    let chunks = table.chunks(chunk_size);
    log::debug!(
        "processing {} rows as {} chunk(s) of up to {} rows",
        table.num_rows(),
        chunks.len(),
        chunk_size
    );
    let processed = map_chunks(chunks, f)?;
    Table::concat(&processed)
}

/// `TypeOptimizer::optimize`, chunked.
pub fn optimize_in_chunks(
    table: Table,
    optimizer: &TypeOptimizer,
    chunk_size: usize,
) -> Result<Table, TrimframeError> {
    process_table_in_chunks(table, chunk_size, |chunk| optimizer.optimize(chunk))
}

/// Runs `pipeline` over each chunk. Only valid for row-local stages, which
/// is every stage `Pipeline` currently offers.
pub fn transform_in_chunks(
    table: Table,
    pipeline: &Pipeline,
    chunk_size: usize,
) -> Result<Table, TrimframeError> {
    process_table_in_chunks(table, chunk_size, |chunk| pipeline.collect(chunk))
}

/// Streams a CSV file in `config.chunk_size_rows` chunks, optimizes the
/// chunks in parallel and returns the reassembled table.
pub fn optimize_csv_in_chunks(
    path: impl AsRef<Path>,
    config: Arc<TrimframeConfig>,
) -> Result<Table, TrimframeError> {
    config.validate()?;
    let reader = read_csv_chunks(path, config.chunk_size_rows)?;
    let schema = reader.schema();
    let chunks = reader.collect::<Result<Vec<_>, _>>()?;

    let optimizer = TypeOptimizer::new(config.optimizer);
    if chunks.is_empty() {
        return optimizer.optimize(Table::new(arrow::record_batch::RecordBatch::new_empty(schema)));
    }
    let optimized = optimize_chunks(chunks, &optimizer)?;
    Table::concat(&optimized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Int16Type, Int64Type};
    use std::fs;
    use tempfile::TempDir;

    use crate::pipeline::{transform, TOTAL_COLUMN};

    fn numbered(rows: i64) -> Table {
        Table::from_columns(vec![
            ("price", Arc::new(Int64Array::from_iter_values(0..rows)) as ArrayRef),
            (
                "quantity",
                Arc::new(Int64Array::from_iter_values((0..rows).map(|i| i % 7))) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_map_chunks_preserves_order() {
        let chunks = numbered(100).chunks(10);
        let out = map_chunks(chunks, Ok).unwrap();
        let firsts: Vec<i64> = out
            .iter()
            .map(|t| t.column(0).as_primitive::<Int64Type>().value(0))
            .collect();
        assert_eq!(firsts, (0..10).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn test_chunked_transform_matches_single_pass() {
        let table = numbered(1000);
        let single = transform(table.clone()).unwrap();
        let chunked = transform_in_chunks(table, &Pipeline::standard(), 64).unwrap();

        assert_eq!(chunked.num_rows(), single.num_rows());
        assert_eq!(
            chunked.column_by_name(TOTAL_COLUMN).unwrap().as_ref(),
            single.column_by_name(TOTAL_COLUMN).unwrap().as_ref()
        );
    }

    #[test]
    fn test_chunks_with_different_widths_are_unified() {
        // The first chunk fits Int8, the second needs Int16.
        let table = Table::from_columns(vec![(
            "v",
            Arc::new(Int64Array::from(vec![1, 2, 3, 300])) as ArrayRef,
        )])
        .unwrap();

        let out = optimize_in_chunks(table, &TypeOptimizer::default(), 3).unwrap();

        assert_eq!(out.column(0).data_type(), &DataType::Int16);
        assert_eq!(
            out.column(0).as_primitive::<Int16Type>().values().to_vec(),
            vec![1, 2, 3, 300]
        );
    }

    #[test]
    fn test_chunks_mixing_categorical_and_text_fall_back_to_text() {
        // Chunk one is low-cardinality, chunk two is all distinct.
        let table = Table::from_columns(vec![(
            "c",
            Arc::new(StringArray::from(vec!["a", "a", "a", "a", "x", "y"])) as ArrayRef,
        )])
        .unwrap();

        let out = optimize_in_chunks(table, &TypeOptimizer::default(), 4).unwrap();

        assert_eq!(out.column(0).data_type(), &DataType::Utf8);
        let values: Vec<&str> = out.column(0).as_string::<i32>().iter().flatten().collect();
        assert_eq!(values, vec!["a", "a", "a", "a", "x", "y"]);
    }

    #[test]
    fn test_empty_table_still_runs_closure_once() {
        let empty = numbered(0);
        let out = transform_in_chunks(empty, &Pipeline::standard(), 10).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert!(out.column_by_name(TOTAL_COLUMN).is_some());
    }

    #[test]
    fn test_zero_chunk_size_is_config_error() {
        let err = optimize_in_chunks(numbered(5), &TypeOptimizer::default(), 0).unwrap_err();
        assert!(matches!(err, TrimframeError::ConfigError(_)));
    }

    #[test]
    fn test_chunk_error_is_propagated() {
        let table = Table::from_columns(vec![(
            "price",
            Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
        )])
        .unwrap();
        let err = transform_in_chunks(table, &Pipeline::standard(), 1).unwrap_err();
        assert!(matches!(err, TrimframeError::SchemaError(_)));
    }

    #[test]
    fn test_optimize_csv_in_chunks_with_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.csv");
        fs::write(&path, "price,quantity\n600,2\n800,2\n").unwrap();

        let out = optimize_csv_in_chunks(&path, Arc::new(TrimframeConfig::default())).unwrap();

        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.column_by_name("price").unwrap().data_type(), &DataType::Int16);
    }

    #[test]
    fn test_optimize_csv_in_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sales.csv");
        let mut csv = String::from("id,category,price\n");
        for i in 0..50 {
            csv.push_str(&format!("{},{},{}\n", i, if i % 2 == 0 { "A" } else { "B" }, i * 10));
        }
        fs::write(&path, csv).unwrap();

        let config = Arc::new(TrimframeConfig {
            chunk_size_rows: 10,
            ..TrimframeConfig::default()
        });
        let out = optimize_csv_in_chunks(&path, config).unwrap();

        assert_eq!(out.num_rows(), 50);
        assert_eq!(out.column_by_name("id").unwrap().data_type(), &DataType::Int8);
        assert_eq!(out.column_by_name("price").unwrap().data_type(), &DataType::Int16);
        assert!(matches!(
            out.column_by_name("category").unwrap().data_type(),
            DataType::Dictionary(..)
        ));
        assert_eq!(out.column_by_name("category").unwrap().null_count(), 0);
    }
}
