//! Record file decoding
//!
//! Input files hold one JSON object per line. A file that is a single
//! pretty-printed object (or an array of objects) is accepted as well.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Decode the records of one file
pub fn decode_records(path: &str, data: &[u8]) -> Result<Vec<JsonValue>> {
    let body = std::str::from_utf8(data).map_err(|e| Error::Decode {
        path: path.to_string(),
        line: 0,
        message: format!("invalid UTF-8: {e}"),
    })?;
    let body = body.trim_start_matches('\u{feff}');

    match decode_lines(path, body) {
        Ok(records) => Ok(records),
        Err(line_error) => decode_document(body).ok_or(line_error),
    }
}

/// One object per line, blank lines skipped
fn decode_lines(path: &str, body: &str) -> Result<Vec<JsonValue>> {
    let mut records = Vec::new();

    for (line_num, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: JsonValue = serde_json::from_str(line).map_err(|e| Error::Decode {
            path: path.to_string(),
            line: line_num + 1,
            message: e.to_string(),
        })?;

        if !value.is_object() {
            return Err(Error::Decode {
                path: path.to_string(),
                line: line_num + 1,
                message: "expected a JSON object".to_string(),
            });
        }
        records.push(value);
    }

    Ok(records)
}

/// Whole-file fallback for multi-line documents
fn decode_document(body: &str) -> Option<Vec<JsonValue>> {
    match serde_json::from_str::<JsonValue>(body).ok()? {
        value @ JsonValue::Object(_) => Some(vec![value]),
        JsonValue::Array(items) if items.iter().all(JsonValue::is_object) => Some(items),
        _ => None,
    }
}
