//! Output module
//!
//! Persists star schema tables as partitioned Parquet.
//!
//! # Overview
//!
//! This module provides:
//! - Parquet encoding of Arrow RecordBatches
//! - Hive-style `column=value` partitioning
//! - The `TableSink` contract and its Parquet implementation
//!
//! Layout of one table:
//!
//! ```text
//! songs/
//!   song_year=2000/artist_id=ARJIE2Y1187B994AB7/part-00000.parquet
//!   song_year=0/artist_id=AR5KOSW1187FB35FF4/part-00000.parquet
//!   _SUCCESS
//! ```

mod partition;
mod sink;
mod writer;

pub use partition::{split_partitions, Partition, DEFAULT_PARTITION};
pub use sink::{ParquetSink, TableSink, WriteSummary, PART_FILE, SUCCESS_MARKER};
pub use writer::{encode_parquet, ParquetWriterConfig};
