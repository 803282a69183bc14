use super::*;
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Int64Type};
use std::sync::Arc;

use crate::optimizer::TypeOptimizer;

fn price_quantity(prices: Vec<i64>, quantities: Vec<i64>) -> Table {
    Table::from_columns(vec![
        ("price", Arc::new(Int64Array::from(prices)) as ArrayRef),
        ("quantity", Arc::new(Int64Array::from(quantities)) as ArrayRef),
    ])
    .unwrap()
}

fn totals(table: &Table) -> Vec<i64> {
    table
        .column_by_name(TOTAL_COLUMN)
        .unwrap()
        .as_primitive::<Int64Type>()
        .values()
        .to_vec()
}

#[test]
fn test_all_totals_at_or_below_threshold_yield_empty_result() {
    let table = price_quantity(vec![100, 200, 150], vec![2, 3, 4]);

    // Totals before filtering are 200, 600, 600.
    let derived = Pipeline::new()
        .with_product(TOTAL_COLUMN, "price", "quantity")
        .collect(table.clone())
        .unwrap();
    assert_eq!(totals(&derived), vec![200, 600, 600]);

    let out = transform(table).unwrap();
    assert_eq!(out.num_rows(), 0);
    assert!(out.column_by_name(TOTAL_COLUMN).is_some());
}

#[test]
fn test_totals_above_threshold_are_retained() {
    let table = price_quantity(vec![600, 800], vec![2, 2]);

    let out = transform(table).unwrap();

    assert_eq!(out.num_rows(), 2);
    assert_eq!(out.column_names(), vec!["price", "quantity", "total"]);
    assert_eq!(totals(&out), vec![1200, 1600]);
}

#[test]
fn test_total_exactly_at_threshold_is_excluded() {
    let table = price_quantity(vec![500, 501], vec![2, 2]);
    let out = transform(table).unwrap();
    assert_eq!(totals(&out), vec![1002]);
}

#[test]
fn test_null_rows_are_dropped_before_deriving() {
    let table = Table::from_columns(vec![
        (
            "price",
            Arc::new(Int64Array::from(vec![Some(600), None, Some(900)])) as ArrayRef,
        ),
        (
            "quantity",
            Arc::new(Int64Array::from(vec![Some(2), Some(5), Some(2)])) as ArrayRef,
        ),
        (
            "note",
            Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])) as ArrayRef,
        ),
    ])
    .unwrap();

    let out = transform(table).unwrap();

    assert_eq!(out.num_rows(), 1);
    assert_eq!(totals(&out), vec![1200]);
    assert_eq!(out.column_by_name(TOTAL_COLUMN).unwrap().null_count(), 0);
}

#[test]
fn test_missing_column_is_schema_error_at_collect_time() {
    let table = Table::from_columns(vec![("price", Arc::new(Int64Array::from(vec![1])) as ArrayRef)]).unwrap();

    // Building the chain must not fail.
    let lazy = table.lazy().drop_nulls().with_product("total", "price", "quantity");
    assert_eq!(lazy.pipeline().stages().len(), 2);

    let err = lazy.collect().unwrap_err();
    assert!(matches!(err, TrimframeError::SchemaError(_)));
}

#[test]
fn test_non_numeric_column_is_schema_error() {
    let table = Table::from_columns(vec![
        ("price", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ("quantity", Arc::new(StringArray::from(vec!["two"])) as ArrayRef),
    ])
    .unwrap();
    assert!(matches!(transform(table), Err(TrimframeError::SchemaError(_))));
}

#[test]
fn test_arrow_failures_are_tagged_with_stage() {
    let table = price_quantity(vec![i64::MAX], vec![2]);
    match transform(table) {
        Err(TrimframeError::PipelineError { stage, source }) => {
            assert_eq!(stage, "with_product");
            assert!(matches!(*source, TrimframeError::Arrow(_)));
        }
        other => panic!("Expected PipelineError, got {:?}", other),
    }
}

#[test]
fn test_transform_is_deterministic() {
    let table = price_quantity(vec![600, 100, 800, 999], vec![2, 3, 2, 2]);
    let first = transform(table.clone()).unwrap();
    let second = transform(table).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_stages_run_in_chain_order() {
    // Filtering before deriving sees the original `total`, not the product.
    let table = Table::from_columns(vec![
        ("price", Arc::new(Int64Array::from(vec![600, 800])) as ArrayRef),
        ("quantity", Arc::new(Int64Array::from(vec![2, 2])) as ArrayRef),
        ("total", Arc::new(Int64Array::from(vec![5000, 0])) as ArrayRef),
    ])
    .unwrap();

    let out = table
        .lazy()
        .filter_gt("total", 1000_i64)
        .with_product("total", "price", "quantity")
        .collect()
        .unwrap();

    assert_eq!(out.num_rows(), 1);
    assert_eq!(totals(&out), vec![1200]);
    // Replaced in place, not appended.
    assert_eq!(out.num_columns(), 3);
}

#[test]
fn test_float_prices_produce_float_totals() {
    let table = Table::from_columns(vec![
        ("price", Arc::new(Float64Array::from(vec![500.25, 499.75])) as ArrayRef),
        ("quantity", Arc::new(Int64Array::from(vec![2, 2])) as ArrayRef),
    ])
    .unwrap();
    let out = transform(table).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(out.column_by_name(TOTAL_COLUMN).unwrap().data_type(), &DataType::Float64);
}

#[test]
fn test_transform_after_optimize_matches_unoptimized_result() {
    let table = Table::from_columns(vec![
        ("id", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef),
        (
            "category",
            Arc::new(StringArray::from(vec!["A", "A", "A", "B", "A"])) as ArrayRef,
        ),
        ("price", Arc::new(Int64Array::from(vec![100, 600, 150, 250, 300])) as ArrayRef),
        ("quantity", Arc::new(Int64Array::from(vec![2, 3, 4, 5, 6])) as ArrayRef),
    ])
    .unwrap();

    let plain = transform(table.clone()).unwrap();
    let optimized = TypeOptimizer::default().optimize(table).unwrap();
    let chained = transform(optimized).unwrap();

    assert_eq!(totals(&plain), totals(&chained));
    assert_eq!(totals(&chained), vec![1800, 1250, 1800]);
}

#[test]
fn test_pipeline_plan_round_trips_through_json() {
    let pipeline = Pipeline::standard();
    let json = serde_json::to_string(&pipeline).unwrap();
    let back: Pipeline = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pipeline);
    assert_eq!(
        back.stages().iter().map(Stage::name).collect::<Vec<_>>(),
        vec!["drop_nulls", "with_product", "filter_gt"]
    );
}
