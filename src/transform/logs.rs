//! Log extractor: users dimension and the play-event subset of log records

use super::columns::{column, dedup_latest, project, string_values, ColumnSpec};
use super::tables::{play_event_columns, user_columns, LOG_RECORDS};
use crate::error::Result;
use arrow::array::BooleanArray;
use arrow::compute::filter_record_batch;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use tracing::info;

/// Page value of a song playback
pub const PLAY_EVENT_PAGE: &str = "NextSong";

/// Outputs of the log extractor
#[derive(Debug, Clone)]
pub struct LogTables {
    /// One row per userId
    pub users: RecordBatch,
    /// Log records with `page == "NextSong"`
    pub play_events: RecordBatch,
}

/// Build the users dimension and filter play events
pub fn extract_logs(log_records: &RecordBatch) -> Result<LogTables> {
    let users = extract_users(log_records)?;
    let play_events = filter_play_events(log_records)?;

    info!(
        records = log_records.num_rows(),
        users = users.num_rows(),
        play_events = play_events.num_rows(),
        "Extracted log tables"
    );

    Ok(LogTables { users, play_events })
}

/// Users from every log record, whatever the page
///
/// A user seen at several levels keeps the row of their most recent event.
pub fn extract_users(log_records: &RecordBatch) -> Result<RecordBatch> {
    let mut specs = user_columns();
    let width = specs.len();
    specs.push(ColumnSpec::kept("ts", DataType::Int64));

    let users = project(log_records, LOG_RECORDS, &specs)?;
    let users = dedup_latest(&users, LOG_RECORDS, "userId", "ts")?;

    let keep: Vec<usize> = (0..width).collect();
    Ok(users.project(&keep)?)
}

/// Play events only, projected to the columns the fact table needs
pub fn filter_play_events(log_records: &RecordBatch) -> Result<RecordBatch> {
    let pages = string_values(column(log_records, LOG_RECORDS, "page")?)?;
    let mask: BooleanArray = pages
        .iter()
        .map(|page| Some(page == Some(PLAY_EVENT_PAGE)))
        .collect();

    let plays = filter_record_batch(log_records, &mask)?;
    project(&plays, LOG_RECORDS, &play_event_columns())
}
