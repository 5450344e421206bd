//! Hive-style partitioning
//!
//! Rows are grouped by the values of the partition columns. Each group lands
//! in `col1=v1/col2=v2/` and its files no longer carry those columns.

use crate::error::{Error, Result};
use crate::transform::{string_values, take_rows};
use arrow::array::StringArray;
use arrow::record_batch::RecordBatch;
use object_store::path::Path as ObjectPath;
use std::collections::BTreeMap;

/// Directory name used for null or empty partition values
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Rows sharing one combination of partition values
#[derive(Debug, Clone)]
pub struct Partition {
    /// (column, value) pairs in partition column order
    pub values: Vec<(String, Option<String>)>,
    /// Rows without the partition columns
    pub batch: RecordBatch,
}

impl Partition {
    /// Relative directory of this partition, empty when unpartitioned
    pub fn dir(&self) -> ObjectPath {
        ObjectPath::from_iter(self.values.iter().map(|(column, value)| {
            let value = value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_PARTITION);
            format!("{column}={value}")
        }))
    }
}

/// Split a table by partition columns, groups in sorted value order
pub fn split_partitions(batch: &RecordBatch, columns: &[&str]) -> Result<Vec<Partition>> {
    if columns.is_empty() {
        return Ok(vec![Partition {
            values: Vec::new(),
            batch: batch.clone(),
        }]);
    }

    let schema = batch.schema();
    let mut key_indices = Vec::with_capacity(columns.len());
    for column in columns {
        let index = schema
            .index_of(column)
            .map_err(|_| Error::transform(format!("unknown partition column '{column}'")))?;
        key_indices.push(index);
    }

    let keys: Vec<StringArray> = key_indices
        .iter()
        .map(|&i| string_values(batch.column(i)))
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<Vec<Option<&str>>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let key: Vec<Option<&str>> = keys.iter().map(|k| value_at(k, row)).collect();
        groups.entry(key).or_default().push(row as u32);
    }

    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !key_indices.contains(i))
        .collect();
    let data = batch.project(&data_indices)?;

    groups
        .into_iter()
        .map(|(key, rows)| {
            let values = columns
                .iter()
                .zip(key)
                .map(|(c, v)| ((*c).to_string(), v.map(String::from)))
                .collect();
            Ok(Partition {
                values,
                batch: take_rows(&data, &rows)?,
            })
        })
        .collect()
}

fn value_at(array: &StringArray, row: usize) -> Option<&str> {
    use arrow::array::Array;
    array.is_valid(row).then(|| array.value(row))
}
