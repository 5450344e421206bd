//! Arrow schema inference and JSON to Arrow conversion
//!
//! One schema is inferred over a whole record set: the union of all keys,
//! sorted by name, every field nullable. Nested objects and arrays are kept
//! as their JSON text.

use crate::error::Result;
use crate::types::JsonValue;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Infer an Arrow schema from a set of JSON records
pub fn infer_schema(records: &[JsonValue]) -> Schema {
    let mut field_types: BTreeMap<&str, DataType> = BTreeMap::new();

    for record in records {
        let JsonValue::Object(obj) = record else {
            continue;
        };
        for (key, value) in obj {
            let inferred = infer_type(value);
            field_types
                .entry(key.as_str())
                .and_modify(|existing| *existing = merge_types(existing, &inferred))
                .or_insert(inferred);
        }
    }

    Schema::new(
        field_types
            .into_iter()
            .map(|(name, dtype)| Field::new(name, dtype, true))
            .collect::<Vec<_>>(),
    )
}

/// Convert JSON records to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data. Keys missing from a
/// record become nulls.
pub fn records_to_batch(records: &[JsonValue], schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(s) => s.clone(),
        None => infer_schema(records),
    };

    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| {
            let values: Vec<Option<&JsonValue>> = records
                .iter()
                .map(|record| record.get(field.name()).filter(|v| !v.is_null()))
                .collect();
            build_array(&values, field.data_type())
        })
        .collect();

    let options = arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(records.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(schema),
        columns,
        &options,
    )?)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &JsonValue) -> DataType {
    match value {
        JsonValue::Null => DataType::Null,
        JsonValue::Bool(_) => DataType::Boolean,
        JsonValue::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        JsonValue::String(_) | JsonValue::Array(_) | JsonValue::Object(_) => DataType::Utf8,
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        // Anything else mixed falls back to text
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&JsonValue>], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Null => Arc::new(NullArray::new(values.len())),

        DataType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_bool))
                .collect::<BooleanArray>(),
        ),

        DataType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_i64))
                .collect::<Int64Array>(),
        ),

        DataType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_f64))
                .collect::<Float64Array>(),
        ),

        _ => Arc::new(
            values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect::<StringArray>(),
        ),
    }
}
