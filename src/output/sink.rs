//! Table sinks
//!
//! A sink persists one table at a location relative to its storage root.

use super::partition::split_partitions;
use super::writer::{encode_parquet, ParquetWriterConfig};
use crate::error::{Error, Result};
use crate::storage::{Storage, StorageOptions};
use crate::types::WriteMode;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use serde::Serialize;
use tracing::{debug, info};

/// Name of each data file inside a partition directory
pub const PART_FILE: &str = "part-00000.parquet";

/// Marker written after every data file of a table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// What a table write produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Display path of the table location
    pub location: String,
    /// Rows written
    pub rows: usize,
    /// Data files written
    pub files: usize,
    /// Objects removed before writing
    pub replaced: usize,
}

/// Destination for whole tables
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Persist `table` under `location`, one directory per distinct
    /// combination of `partition_columns` values
    async fn write_table(
        &self,
        table: &RecordBatch,
        location: &str,
        partition_columns: &[&str],
        mode: WriteMode,
    ) -> Result<WriteSummary>;
}

/// Writes tables as Parquet files into a storage root
#[derive(Debug, Clone)]
pub struct ParquetSink {
    storage: Storage,
    config: ParquetWriterConfig,
}

impl ParquetSink {
    /// Create a sink over an opened storage root
    pub fn new(storage: Storage, config: ParquetWriterConfig) -> Self {
        Self { storage, config }
    }

    /// Open an output location
    pub fn open(
        location: &str,
        options: &StorageOptions,
        config: ParquetWriterConfig,
    ) -> Result<Self> {
        Ok(Self::new(Storage::open_for_write(location, options)?, config))
    }

    /// The underlying storage root
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[async_trait]
impl TableSink for ParquetSink {
    async fn write_table(
        &self,
        table: &RecordBatch,
        location: &str,
        partition_columns: &[&str],
        mode: WriteMode,
    ) -> Result<WriteSummary> {
        let root = ObjectPath::from(location);
        let target = self.storage.display(&root);

        let schema = table.schema();
        if let Some(unknown) = partition_columns
            .iter()
            .find(|c| schema.column_with_name(c).is_none())
        {
            return Err(Error::write(
                target,
                format!("unknown partition column '{unknown}'"),
            ));
        }

        let replaced = match mode {
            WriteMode::Overwrite => self.storage.delete_prefix(&root).await?,
            WriteMode::ErrorIfExists => {
                if self.storage.exists(&root).await? {
                    return Err(Error::write(target, "location already exists"));
                }
                0
            }
        };

        let partitions = split_partitions(table, partition_columns)
            .map_err(|e| Error::write(target.clone(), e.to_string()))?;

        let mut files = 0;
        for partition in &partitions {
            let data = encode_parquet(&partition.batch, &self.config)?;
            let path = ObjectPath::from_iter(
                root.parts()
                    .chain(partition.dir().parts())
                    .chain(ObjectPath::from(PART_FILE).parts()),
            );
            self.storage.put(&path, data).await?;
            debug!(path = %path, rows = partition.batch.num_rows(), "Wrote partition");
            files += 1;
        }

        let marker = ObjectPath::from_iter(root.parts().chain(ObjectPath::from(SUCCESS_MARKER).parts()));
        self.storage.put(&marker, Bytes::new()).await?;

        info!(
            location = %target,
            rows = table.num_rows(),
            files,
            replaced,
            "Wrote table"
        );

        Ok(WriteSummary {
            location: target,
            rows: table.num_rows(),
            files,
            replaced,
        })
    }
}
