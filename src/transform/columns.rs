//! Column-level building blocks shared by the extractors
//!
//! Projection with rename and cast, row selection, key deduplication.

use crate::error::{Error, Result};
use arrow::array::{Array, ArrayRef, AsArray, StringArray, UInt32Array};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One output column: where it comes from, what it is called, its type
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name in the input batch
    pub source: &'static str,
    /// Column name in the output batch
    pub name: &'static str,
    /// Output type (the input is cast to it)
    pub data_type: DataType,
}

impl ColumnSpec {
    /// Column with a new name
    pub fn renamed(source: &'static str, name: &'static str, data_type: DataType) -> Self {
        Self {
            source,
            name,
            data_type,
        }
    }

    /// Column that keeps its name
    pub fn kept(name: &'static str, data_type: DataType) -> Self {
        Self::renamed(name, name, data_type)
    }

    /// Output field
    pub fn field(&self) -> Field {
        Field::new(self.name, self.data_type.clone(), true)
    }
}

/// Look up a column, failing with a schema error when the record set lacks it
pub fn column<'a>(batch: &'a RecordBatch, table: &str, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::missing_column(table, name))
}

/// Select, rename and cast columns
pub fn project(batch: &RecordBatch, table: &str, specs: &[ColumnSpec]) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(specs.len());
    for spec in specs {
        let source = column(batch, table, spec.source)?;
        columns.push(cast(source, &spec.data_type)?);
    }

    let schema = Schema::new(specs.iter().map(ColumnSpec::field).collect::<Vec<_>>());
    with_columns(Arc::new(schema), columns, batch.num_rows())
}

/// Build a batch that keeps its row count even without columns
pub fn with_columns(
    schema: Arc<Schema>,
    columns: Vec<ArrayRef>,
    num_rows: usize,
) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Append columns to the right of a batch
pub fn append_columns(
    batch: &RecordBatch,
    fields: Vec<Field>,
    arrays: Vec<ArrayRef>,
) -> Result<RecordBatch> {
    if fields.len() != arrays.len() {
        return Err(Error::transform(format!(
            "{} fields for {} columns",
            fields.len(),
            arrays.len()
        )));
    }

    let mut all_fields: Vec<Field> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    all_fields.extend(fields);

    let mut columns = batch.columns().to_vec();
    columns.extend(arrays);

    with_columns(Arc::new(Schema::new(all_fields)), columns, batch.num_rows())
}

/// Keep the named columns, in the given order
pub fn select(batch: &RecordBatch, table: &str, names: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = names
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| Error::missing_column(table, *name))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Gather rows by index
pub fn take_rows(batch: &RecordBatch, indices: &[u32]) -> Result<RecordBatch> {
    let indices = UInt32Array::from(indices.to_vec());
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    with_columns(batch.schema(), columns, indices.len())
}

/// Any column as text, for keys and path segments
///
/// Timestamps are rendered as their raw epoch value, independent of zone.
pub fn string_values(array: &ArrayRef) -> Result<StringArray> {
    let text = match array.data_type() {
        DataType::Timestamp(_, _) => cast(&cast(array, &DataType::Int64)?, &DataType::Utf8)?,
        _ => cast(array, &DataType::Utf8)?,
    };
    Ok(text.as_string::<i32>().clone())
}

/// One row per distinct key, the first occurrence wins
///
/// A null key is a key of its own.
pub fn dedup_first(batch: &RecordBatch, table: &str, key: &str) -> Result<RecordBatch> {
    let keys = string_values(column(batch, table, key)?)?;
    let mut seen: HashSet<Option<&str>> = HashSet::with_capacity(keys.len());

    let indices: Vec<u32> = keys
        .iter()
        .enumerate()
        .filter_map(|(i, k)| seen.insert(k).then_some(i as u32))
        .collect();

    take_rows(batch, &indices)
}

/// One row per distinct key, the row with the greatest `order` value wins
///
/// Nulls in `order` sort lowest and ties keep the earliest row. Output rows
/// follow the first appearance of each key.
pub fn dedup_latest(batch: &RecordBatch, table: &str, key: &str, order: &str) -> Result<RecordBatch> {
    let keys = string_values(column(batch, table, key)?)?;
    let order = cast(column(batch, table, order)?, &DataType::Int64)?;
    let order = order.as_primitive::<Int64Type>();

    let mut best: HashMap<Option<&str>, (u32, Option<i64>)> = HashMap::new();
    let mut first_seen: Vec<Option<&str>> = Vec::new();

    for (i, k) in keys.iter().enumerate() {
        let rank = order.is_valid(i).then(|| order.value(i));
        match best.entry(k) {
            Entry::Vacant(slot) => {
                slot.insert((i as u32, rank));
                first_seen.push(k);
            }
            Entry::Occupied(mut slot) => {
                if rank > slot.get().1 {
                    slot.insert((i as u32, rank));
                }
            }
        }
    }

    let indices: Vec<u32> = first_seen.iter().map(|k| best[k].0).collect();
    take_rows(batch, &indices)
}
