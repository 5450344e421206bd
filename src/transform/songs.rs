//! Song extractor: songs and artists dimensions from song records

use super::columns::{dedup_first, project};
use super::tables::{artist_columns, song_columns, SONG_RECORDS};
use crate::error::Result;
use arrow::record_batch::RecordBatch;
use tracing::info;

/// Dimensions derived from song records
#[derive(Debug, Clone)]
pub struct SongTables {
    /// One row per song_id
    pub songs: RecordBatch,
    /// One row per artist_id
    pub artists: RecordBatch,
}

/// Build the songs and artists dimensions
///
/// Duplicate keys keep the first record in source order. Null fields pass
/// through as nulls.
pub fn extract_songs(song_records: &RecordBatch) -> Result<SongTables> {
    let songs = project(song_records, SONG_RECORDS, &song_columns())?;
    let songs = dedup_first(&songs, SONG_RECORDS, "song_id")?;

    let artists = project(song_records, SONG_RECORDS, &artist_columns())?;
    let artists = dedup_first(&artists, SONG_RECORDS, "artist_id")?;

    info!(
        records = song_records.num_rows(),
        songs = songs.num_rows(),
        artists = artists.num_rows(),
        "Extracted song dimensions"
    );

    Ok(SongTables { songs, artists })
}
