// In: src/table.rs

//! The `Table` type: an ordered set of named, equal-length, homogeneously typed
//! columns.
//!
//! `Table` is a thin owner of an Arrow `RecordBatch`. Arrow already guarantees
//! the structural invariants (unique positions, aligned lengths), so this layer
//! only adds what the optimizer and the pipeline need on top: lookups by name,
//! column replacement that keeps the schema in sync, a footprint model, and
//! order-preserving concatenation of independently optimized chunks.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, GenericStringArray, OffsetSizeTrait, RecordBatch, RecordBatchOptions,
};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};

use crate::error::TrimframeError;
use crate::types::{ColumnKind, IntWidth};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl From<RecordBatch> for Table {
    fn from(batch: RecordBatch) -> Self {
        Self { batch }
    }
}

impl From<Table> for RecordBatch {
    fn from(table: Table) -> Self {
        table.batch
    }
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Builds a table from `(name, array)` pairs. Every field is declared nullable.
    ///
    /// # Errors
    /// Returns `TrimframeError::Arrow` if the arrays do not share a length.
    pub fn from_columns<N: Into<String>>(
        columns: impl IntoIterator<Item = (N, ArrayRef)>,
    ) -> Result<Self, TrimframeError> {
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
            .into_iter()
            .map(|(name, array)| (Field::new(name, array.data_type().clone(), true), array))
            .unzip();
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self { batch })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn columns(&self) -> &[ArrayRef] {
        self.batch.columns()
    }

    pub fn column(&self, idx: usize) -> &ArrayRef {
        self.batch.column(idx)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.batch.schema_ref().index_of(name).ok()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column_by_name(name)
            .map(|array| ColumnKind::from_arrow_type(array.data_type()))
    }

    /// Swaps the array at `idx`, updating the field's declared type to match.
    pub fn replace_column(self, idx: usize, array: ArrayRef) -> Result<Self, TrimframeError> {
        let schema = self.batch.schema();
        if idx >= schema.fields().len() {
            return Err(TrimframeError::InternalError(format!(
                "Column index {} out of bounds for a table with {} columns",
                idx,
                schema.fields().len()
            )));
        }
        let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
        fields[idx] = Arc::new(
            fields[idx]
                .as_ref()
                .clone()
                .with_data_type(array.data_type().clone()),
        );
        let mut columns = self.batch.columns().to_vec();
        columns[idx] = array;
        Self::rebuild(fields, columns, self.batch.num_rows())
    }

    /// Replaces the column called `name` in place, or appends it if absent.
    pub fn with_column(self, name: &str, array: ArrayRef) -> Result<Self, TrimframeError> {
        if let Some(idx) = self.index_of(name) {
            return self.replace_column(idx, array);
        }
        let num_rows = self.batch.num_rows();
        let mut fields: Vec<FieldRef> = self.batch.schema().fields().iter().cloned().collect();
        fields.push(Arc::new(Field::new(name, array.data_type().clone(), true)));
        let mut columns = self.batch.columns().to_vec();
        columns.push(array);
        Self::rebuild(fields, columns, num_rows)
    }

    fn rebuild(
        fields: Vec<FieldRef>,
        columns: Vec<ArrayRef>,
        num_rows: usize,
    ) -> Result<Self, TrimframeError> {
        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;
        Ok(Self { batch })
    }

    /// Zero-copy row slice.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            batch: self.batch.slice(offset, length),
        }
    }

    /// Splits the table into consecutive row chunks of at most `chunk_size` rows.
    pub fn chunks(&self, chunk_size: usize) -> Vec<Self> {
        let chunk_size = chunk_size.max(1);
        let mut out = Vec::with_capacity(self.num_rows().div_ceil(chunk_size));
        let mut offset = 0;
        while offset < self.num_rows() {
            let length = std::cmp::min(chunk_size, self.num_rows() - offset);
            out.push(self.slice(offset, length));
            offset += length;
        }
        out
    }

    //==============================================================================
    // Footprint model
    //==============================================================================

    /// Per-column footprint in bytes, in schema order.
    pub fn memory_usage(&self) -> Vec<(String, usize)> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| (field.name().clone(), column_footprint(array.as_ref())))
            .collect()
    }

    /// Sum of `memory_usage` over all columns.
    pub fn memory_footprint(&self) -> usize {
        self.batch
            .columns()
            .iter()
            .map(|array| column_footprint(array.as_ref()))
            .sum()
    }

    //==============================================================================
    // Concatenation
    //==============================================================================

    /// Concatenates tables row-wise in the order given.
    ///
    /// Chunks optimized independently can disagree on storage widths (one chunk
    /// narrowed to `Int8`, the next to `Int16`) or on encoding. Each column is
    /// first cast to a common type: the widest width for numeric kinds, text
    /// when categorical and plain text chunks meet, and a key wide enough for
    /// every chunk's dictionary when all chunks are categorical.
    ///
    /// # Errors
    /// Returns `TrimframeError::SchemaError` if the tables do not share column names.
    pub fn concat(tables: &[Table]) -> Result<Self, TrimframeError> {
        let Some(first) = tables.first() else {
            return Err(TrimframeError::InternalError(
                "Cannot concatenate an empty list of tables".to_string(),
            ));
        };
        let names = first.column_names();
        for table in &tables[1..] {
            if table.column_names() != names {
                return Err(TrimframeError::SchemaError(format!(
                    "Cannot concatenate tables with columns {:?} and {:?}",
                    names,
                    table.column_names()
                )));
            }
        }

        let mut fields = Vec::with_capacity(names.len());
        for (idx, field) in first.schema().fields().iter().enumerate() {
            let columns: Vec<&ArrayRef> = tables.iter().map(|t| t.column(idx)).collect();
            let nullable = tables
                .iter()
                .any(|t| t.schema().field(idx).is_nullable());
            let unified = unify_column_type(&columns);
            fields.push(Field::new(field.name(), unified, nullable));
        }
        let schema = Arc::new(Schema::new(fields));

        let mut aligned = Vec::with_capacity(tables.len());
        for table in tables {
            let mut columns = Vec::with_capacity(table.num_columns());
            for (array, field) in table.columns().iter().zip(schema.fields()) {
                if array.data_type() == field.data_type() {
                    columns.push(Arc::clone(array));
                } else {
                    columns.push(cast(array, field.data_type())?);
                }
            }
            let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
            aligned.push(RecordBatch::try_new_with_options(
                Arc::clone(&schema),
                columns,
                &options,
            )?);
        }
        Ok(Self {
            batch: concat_batches(&schema, &aligned)?,
        })
    }
}

/// Picks the type every chunk of one column can be cast to without loss.
fn unify_column_type(columns: &[&ArrayRef]) -> DataType {
    let first = columns[0].data_type().clone();
    if columns.iter().all(|c| c.data_type() == &first) && !matches!(first, DataType::Dictionary(..)) {
        return first;
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|c| ColumnKind::from_arrow_type(c.data_type()))
        .collect();

    if let Some(widest) = kinds
        .iter()
        .map(|k| match k {
            ColumnKind::SignedInt(w) => Some(*w),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .and_then(|widths| widths.into_iter().max())
    {
        return widest.to_arrow_type();
    }

    if let Some(widest) = kinds
        .iter()
        .map(|k| match k {
            ColumnKind::Float(w) => Some(*w),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .and_then(|widths| widths.into_iter().max())
    {
        return widest.to_arrow_type();
    }

    if kinds.iter().all(|k| *k == ColumnKind::Categorical) {
        let total_entries: usize = columns
            .iter()
            .filter_map(|c| c.as_any_dictionary_opt())
            .map(|d| d.values().len())
            .sum();
        let value_type = match columns[0].data_type() {
            DataType::Dictionary(_, value) => value.as_ref().clone(),
            _ => DataType::Utf8,
        };
        let key = IntWidth::smallest_for_count(total_entries).unwrap_or(IntWidth::W64);
        return DataType::Dictionary(Box::new(key.to_arrow_type()), Box::new(value_type));
    }

    if kinds
        .iter()
        .all(|k| matches!(k, ColumnKind::Categorical | ColumnKind::Text))
    {
        let any_large = columns.iter().any(|c| match c.data_type() {
            DataType::LargeUtf8 => true,
            DataType::Dictionary(_, value) => value.as_ref() == &DataType::LargeUtf8,
            _ => false,
        });
        return if any_large {
            DataType::LargeUtf8
        } else {
            DataType::Utf8
        };
    }

    first
}

/// Bytes attributed to one column by the footprint model.
///
/// Primitive columns count `width * rows`; text counts its offsets plus the
/// value bytes the rows actually span; categorical counts its keys plus the
/// footprint of its dictionary. A validity bitmap is only counted when the
/// column holds nulls.
pub(crate) fn column_footprint(array: &dyn Array) -> usize {
    let validity = if array.null_count() > 0 {
        array.len().div_ceil(8)
    } else {
        0
    };
    let data = match array.data_type() {
        DataType::Utf8 => string_footprint(array.as_string::<i32>()),
        DataType::LargeUtf8 => string_footprint(array.as_string::<i64>()),
        DataType::Dictionary(key_type, _) => match array.as_any_dictionary_opt() {
            Some(dict) => {
                let key_width = key_type.primitive_width().unwrap_or(8);
                key_width * array.len() + column_footprint(dict.values().as_ref())
            }
            None => array.get_buffer_memory_size(),
        },
        dt => match dt.primitive_width() {
            Some(width) => width * array.len(),
            None => array.get_buffer_memory_size(),
        },
    };
    validity + data
}

fn string_footprint<O: OffsetSizeTrait>(array: &GenericStringArray<O>) -> usize {
    let offsets = array.value_offsets();
    let value_bytes = match (offsets.first(), offsets.last()) {
        (Some(first), Some(last)) => last.as_usize() - first.as_usize(),
        _ => 0,
    };
    offsets.len() * std::mem::size_of::<O>() + value_bytes
}
