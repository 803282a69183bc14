// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the file boundary of trimframe. Everything else in the crate works
// on in-memory `Table`s; only this module knows about paths, CSV and Parquet.
//
// Data Flow (CSV -> Parquet):
//
//   1. [source::read_csv]           -> schema inferred from the head of the file
//         |
//         `-> Table (Int64 / Float64 / Utf8 columns)
//
//   2. [optimizer::TypeOptimizer]   -> narrowed ints, Float32, dictionary text
//         |
//         `-> Table + OptimizationReport
//
//   3. [sink::write_parquet]        -> Snappy-compressed Parquet with the Arrow
//                                      schema embedded in the footer
//
// Large inputs go through `source::read_csv_chunks` instead, which yields one
// `Table` per chunk and feeds the `chunked` module.
// ====================================================================================

mod sink;
mod source;

pub use self::sink::{convert_csv_to_parquet, write_parquet};
pub use self::source::{read_csv, read_csv_chunks, read_lines, read_parquet, CsvChunks};
