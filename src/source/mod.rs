//! Record source module
//!
//! Reads newline-delimited JSON records from a storage root.
//!
//! # Overview
//!
//! - Lists the files under the root that match a wildcard pattern
//! - Decodes every file into JSON objects, in path order
//! - Infers one Arrow schema over the whole record set
//! - Returns the records as a single Arrow `RecordBatch`

mod decode;
mod infer;

pub use decode::decode_records;
pub use infer::{infer_schema, records_to_batch};

use crate::error::{Error, Result};
use crate::storage::{PathPattern, Storage, StorageOptions};
use crate::types::JsonValue;
use arrow::record_batch::RecordBatch;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use tracing::{debug, info};

/// Number of files fetched concurrently
const READ_CONCURRENCY: usize = 16;

/// Reads semi-structured records from a storage root
#[derive(Debug, Clone)]
pub struct RecordSource {
    storage: Storage,
}

impl RecordSource {
    /// Create a source over an opened storage root
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open a source location
    pub fn open(location: &str, options: &StorageOptions) -> Result<Self> {
        Ok(Self::new(Storage::open(location, options)?))
    }

    /// The underlying storage root
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// List the files a pattern selects, in read order
    pub async fn list(&self, pattern: &str) -> Result<Vec<ObjectPath>> {
        let pattern = PathPattern::parse(pattern)?;
        self.storage.list_matching(&pattern).await
    }

    /// Read every record the pattern selects as JSON values
    pub async fn read_values(&self, pattern: &str) -> Result<Vec<JsonValue>> {
        let files = self.list(pattern).await?;
        if files.is_empty() {
            return Err(Error::NoInputFiles {
                pattern: pattern.to_string(),
            });
        }

        let storage = &self.storage;
        let per_file: Vec<Vec<JsonValue>> = futures::stream::iter(files.iter())
            .map(|path| async move {
                let data = storage.get(path).await?;
                let records = decode_records(&storage.display(path), &data)?;
                debug!(path = %path, records = records.len(), "Decoded file");
                Ok::<_, Error>(records)
            })
            .buffered(READ_CONCURRENCY)
            .try_collect()
            .await?;

        let records: Vec<JsonValue> = per_file.into_iter().flatten().collect();
        info!(
            pattern,
            files = files.len(),
            records = records.len(),
            "Read records"
        );
        Ok(records)
    }

    /// Read every record the pattern selects as one batch
    pub async fn read(&self, pattern: &str) -> Result<RecordBatch> {
        let records = self.read_values(pattern).await?;
        records_to_batch(&records, None)
    }
}
