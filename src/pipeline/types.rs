//! Pipeline report types

use crate::output::WriteSummary;
use crate::types::StarTable;
use arrow::record_batch::RecordBatch;
use serde::Serialize;

/// Outcome of writing one star schema table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    /// Table written
    pub table: StarTable,
    /// Partition columns of its layout
    pub partition_columns: Vec<String>,
    /// What the sink reported
    #[serde(flatten)]
    pub write: WriteSummary,
}

/// Outcome of a full run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Input root
    pub input: String,
    /// Output root
    pub output: String,
    /// Song records read
    pub song_records: usize,
    /// Log records read
    pub log_records: usize,
    /// One entry per table, in write order
    pub tables: Vec<TableSummary>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Total rows over all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.write.rows).sum()
    }

    /// Summary of one table
    pub fn table(&self, table: StarTable) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table == table)
    }
}

/// Files each input pattern selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    /// Input root
    pub input: String,
    /// Song file pattern
    pub song_data: String,
    /// Song files matched
    pub song_files: usize,
    /// Log file pattern
    pub log_data: String,
    /// Log files matched
    pub log_files: usize,
}

impl InputSummary {
    /// Whether both patterns select at least one file
    pub fn is_complete(&self) -> bool {
        self.song_files > 0 && self.log_files > 0
    }
}

/// Raw record sets read by the compute stage
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Song metadata records
    pub song_records: RecordBatch,
    /// Application log records
    pub log_records: RecordBatch,
}
