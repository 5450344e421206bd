//! Fact builder: joins play events to song records
//!
//! The join runs against the raw song records, not the deduplicated songs
//! table. Every matching record yields a row, so a title shared by several
//! records fans out.

use super::columns::{column, project, string_values, take_rows, with_columns};
use super::tables::{
    songplay_event_columns, songplay_song_columns, table_schema, PLAY_EVENTS, SONGPLAY_COLUMNS,
    SONG_RECORDS,
};
use crate::error::Result;
use crate::types::{MatchStrategy, StarTable};
use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Run-local songplay_id source
///
/// Ids only ever increase within one generator. Nothing ties them to a
/// particular event across runs.
#[derive(Debug, Default)]
pub struct SongplayIdGenerator {
    next: i64,
}

impl SongplayIdGenerator {
    /// Generator starting at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator starting at `first`
    pub fn starting_at(first: i64) -> Self {
        Self { next: first }
    }

    /// Hand out `count` ids
    pub fn next_ids(&mut self, count: usize) -> Int64Array {
        let start = self.next;
        self.next += count as i64;
        Int64Array::from_iter_values(start..self.next)
    }
}

/// Build the songplays fact table
pub fn build_songplays(
    timed_events: &RecordBatch,
    song_records: &RecordBatch,
    strategy: MatchStrategy,
    ids: &mut SongplayIdGenerator,
) -> Result<RecordBatch> {
    let (event_rows, song_rows) = match_rows(timed_events, song_records, strategy)?;

    let events = project(timed_events, PLAY_EVENTS, &songplay_event_columns())?;
    let events = take_rows(&events, &event_rows)?;
    let songs = project(song_records, SONG_RECORDS, &songplay_song_columns())?;
    let songs = take_rows(&songs, &song_rows)?;

    let mut columns: Vec<ArrayRef> = vec![Arc::new(ids.next_ids(event_rows.len()))];
    for name in &SONGPLAY_COLUMNS[1..] {
        let (source, table) = if events.schema().column_with_name(name).is_some() {
            (&events, PLAY_EVENTS)
        } else {
            (&songs, SONG_RECORDS)
        };
        columns.push(Arc::clone(column(source, table, name)?));
    }

    let songplays = with_columns(table_schema(StarTable::Songplays), columns, event_rows.len())?;
    info!(
        play_events = timed_events.num_rows(),
        songplays = songplays.num_rows(),
        ?strategy,
        "Built songplays table"
    );
    Ok(songplays)
}

/// Pairs of (event row, song row) that satisfy the join predicate, in event
/// order and then song order
fn match_rows(
    events: &RecordBatch,
    songs: &RecordBatch,
    strategy: MatchStrategy,
) -> Result<(Vec<u32>, Vec<u32>)> {
    let titles = string_values(column(songs, SONG_RECORDS, "title")?)?;
    let played = string_values(column(events, PLAY_EVENTS, "song")?)?;
    let (song_artists, played_artists) = match strategy {
        MatchStrategy::Title => (None, None),
        MatchStrategy::TitleAndArtist => (
            Some(string_values(column(songs, SONG_RECORDS, "artist_name")?)?),
            Some(string_values(column(events, PLAY_EVENTS, "artist")?)?),
        ),
    };

    let mut by_key: HashMap<(&str, Option<&str>), Vec<u32>> = HashMap::new();
    for (i, title) in titles.iter().enumerate() {
        if let Some(key) = join_key(title, song_artists.as_ref(), i) {
            by_key.entry(key).or_default().push(i as u32);
        }
    }

    let mut event_rows = Vec::new();
    let mut song_rows = Vec::new();
    for (i, song) in played.iter().enumerate() {
        let Some(matches) = join_key(song, played_artists.as_ref(), i).and_then(|k| by_key.get(&k))
        else {
            continue;
        };
        for &song_row in matches {
            event_rows.push(i as u32);
            song_rows.push(song_row);
        }
    }

    Ok((event_rows, song_rows))
}

/// Join key of one row; `None` when any part is null
fn join_key<'a>(
    title: Option<&'a str>,
    artists: Option<&'a StringArray>,
    row: usize,
) -> Option<(&'a str, Option<&'a str>)> {
    let title = title?;
    match artists {
        None => Some((title, None)),
        Some(artists) if artists.is_null(row) => None,
        Some(artists) => Some((title, Some(artists.value(row)))),
    }
}
