//! Transform module
//!
//! Pure functions from raw record batches to the star schema tables.
//!
//! # Overview
//!
//! ```text
//! song records ──> extract_songs ──> songs, artists
//!      │
//!      └──────────────────────────────────────┐
//! log records ──> extract_logs ──> users      │
//!                      └─> play events        │
//!                            └─> attach_time_columns ──> time
//!                                      └─> build_songplays ──> songplays
//! ```
//!
//! Nothing here performs I/O. Every stage takes batches and returns batches.

mod columns;
mod logs;
mod songplays;
mod songs;
mod tables;
mod time;

pub use columns::{dedup_first, dedup_latest, project, string_values, take_rows, ColumnSpec};
pub use logs::{extract_logs, extract_users, filter_play_events, LogTables, PLAY_EVENT_PAGE};
pub use songplays::{build_songplays, SongplayIdGenerator};
pub use songs::{extract_songs, SongTables};
pub use tables::{start_time_type, table_schema, TIME_ZONE};
pub use time::{attach_time_columns, build_time_table, decompose_timestamp, TimeParts};

use crate::error::Result;
use crate::types::{MatchStrategy, StarTable};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

/// Knobs of the transformation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// How play events find their song
    #[serde(default)]
    pub match_strategy: MatchStrategy,
}

/// The five computed tables of one run
#[derive(Debug, Clone)]
pub struct StarSchema {
    pub songs: RecordBatch,
    pub artists: RecordBatch,
    pub users: RecordBatch,
    pub time: RecordBatch,
    pub songplays: RecordBatch,
}

impl StarSchema {
    /// Batch of one table
    pub fn table(&self, table: StarTable) -> &RecordBatch {
        match table {
            StarTable::Songs => &self.songs,
            StarTable::Artists => &self.artists,
            StarTable::Users => &self.users,
            StarTable::Time => &self.time,
            StarTable::Songplays => &self.songplays,
        }
    }

    /// Tables in write order
    pub fn tables(&self) -> impl Iterator<Item = (StarTable, &RecordBatch)> {
        StarTable::ALL.into_iter().map(move |t| (t, self.table(t)))
    }
}

/// Compute every table of the star schema
pub fn build_star_schema(
    song_records: &RecordBatch,
    log_records: &RecordBatch,
    options: &TransformOptions,
) -> Result<StarSchema> {
    let SongTables { songs, artists } = extract_songs(song_records)?;
    let LogTables { users, play_events } = extract_logs(log_records)?;

    let timed_events = attach_time_columns(&play_events)?;
    let time = build_time_table(&timed_events)?;

    let mut ids = SongplayIdGenerator::new();
    let songplays = build_songplays(
        &timed_events,
        song_records,
        options.match_strategy,
        &mut ids,
    )?;

    Ok(StarSchema {
        songs,
        artists,
        users,
        time,
        songplays,
    })
}

#[cfg(test)]
mod tests;
