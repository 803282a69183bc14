// In: src/bridge/source.rs

//! Sources: turn files into `Table`s.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::TrimframeError;
use crate::table::Table;

/// Batch size used when the whole file is read at once.
const CSV_BATCH_SIZE: usize = 8192;

fn csv_reader(
    path: &Path,
    batch_size: usize,
) -> Result<(SchemaRef, arrow::csv::Reader<File>), TrimframeError> {
    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    // Scan every record: a column that turns decimal late must still infer as Float64.
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.rewind()?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(batch_size)
        .build(file)?;
    Ok((schema, reader))
}

/// Reads a whole CSV file (header row required) into one `Table`.
///
/// Column types are inferred over the whole file: integers become `Int64`,
/// decimals `Float64`, everything else `Utf8`. Empty fields are nulls.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Table, TrimframeError> {
    let (schema, reader) = csv_reader(path.as_ref(), CSV_BATCH_SIZE)?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    concat_or_empty(schema, &batches)
}

/// Streams a CSV file as consecutive tables of at most `chunk_rows` rows each.
///
/// The schema is inferred over the whole file before the first chunk is
/// yielded, so every chunk shares it.
pub fn read_csv_chunks(
    path: impl AsRef<Path>,
    chunk_rows: usize,
) -> Result<CsvChunks, TrimframeError> {
    if chunk_rows == 0 {
        return Err(TrimframeError::ConfigError(
            "chunk_rows must be greater than zero".to_string(),
        ));
    }
    let (schema, reader) = csv_reader(path.as_ref(), chunk_rows)?;
    Ok(CsvChunks { schema, reader })
}

/// Iterator returned by `read_csv_chunks`.
pub struct CsvChunks {
    schema: SchemaRef,
    reader: arrow::csv::Reader<File>,
}

impl CsvChunks {
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }
}

impl Iterator for CsvChunks {
    type Item = Result<Table, TrimframeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader
            .next()
            .map(|batch| batch.map(Table::new).map_err(TrimframeError::from))
    }
}

/// Reads a text file lazily, yielding each line with surrounding whitespace trimmed.
pub fn read_lines(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<String, TrimframeError>>, TrimframeError> {
    let file = File::open(path)?;
    Ok(BufReader::new(file)
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()).map_err(TrimframeError::from)))
}

/// Reads every row group of a Parquet file into one `Table`.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<Table, TrimframeError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    concat_or_empty(schema, &batches)
}

fn concat_or_empty(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Table, TrimframeError> {
    if batches.is_empty() {
        return Ok(Table::new(RecordBatch::new_empty(schema)));
    }
    Ok(Table::new(arrow::compute::concat_batches(&schema, batches)?))
}
