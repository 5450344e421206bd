//! Column layouts of the inputs and the star schema tables

use super::columns::ColumnSpec;
use crate::types::StarTable;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::Arc;

/// Label for song records in schema errors
pub const SONG_RECORDS: &str = "song";

/// Label for log records in schema errors
pub const LOG_RECORDS: &str = "log";

/// Label for play events in schema errors
pub const PLAY_EVENTS: &str = "play event";

/// Zone every timestamp is decomposed in
pub const TIME_ZONE: &str = "UTC";

/// Type of `start_time`
pub fn start_time_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, Some(TIME_ZONE.into()))
}

/// Songs dimension projection
pub fn song_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("song_id", DataType::Utf8),
        ColumnSpec::renamed("title", "song_title", DataType::Utf8),
        ColumnSpec::kept("artist_id", DataType::Utf8),
        ColumnSpec::renamed("year", "song_year", DataType::Int32),
        ColumnSpec::renamed("duration", "song_duration", DataType::Float64),
    ]
}

/// Artists dimension projection
pub fn artist_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("artist_id", DataType::Utf8),
        ColumnSpec::kept("artist_name", DataType::Utf8),
        ColumnSpec::kept("artist_location", DataType::Utf8),
        ColumnSpec::kept("artist_latitude", DataType::Float64),
        ColumnSpec::kept("artist_longitude", DataType::Float64),
    ]
}

/// Users dimension projection
pub fn user_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("userId", DataType::Utf8),
        ColumnSpec::renamed("firstName", "user_firstname", DataType::Utf8),
        ColumnSpec::renamed("lastName", "user_lastname", DataType::Utf8),
        ColumnSpec::renamed("gender", "user_gender", DataType::Utf8),
        ColumnSpec::renamed("level", "user_level", DataType::Utf8),
    ]
}

/// Columns of a play event as it leaves the log extractor
pub fn play_event_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("ts", DataType::Int64),
        ColumnSpec::kept("userId", DataType::Utf8),
        ColumnSpec::kept("level", DataType::Utf8),
        ColumnSpec::kept("song", DataType::Utf8),
        ColumnSpec::kept("artist", DataType::Utf8),
        ColumnSpec::kept("sessionId", DataType::Int64),
        ColumnSpec::kept("location", DataType::Utf8),
        ColumnSpec::kept("userAgent", DataType::Utf8),
    ]
}

/// Calendar columns the time decomposer appends, in order
pub fn time_fields() -> Vec<Field> {
    vec![
        Field::new("start_time", start_time_type(), true),
        Field::new("ts_hour", DataType::Int32, true),
        Field::new("ts_day", DataType::Int32, true),
        Field::new("ts_week", DataType::Int32, true),
        Field::new("ts_month", DataType::Int32, true),
        Field::new("ts_year", DataType::Int32, true),
        Field::new("ts_weekday", DataType::Int32, true),
    ]
}

/// Play event columns the fact table keeps
pub fn songplay_event_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("start_time", start_time_type()),
        ColumnSpec::renamed("userId", "user_id", DataType::Utf8),
        ColumnSpec::renamed("level", "user_level", DataType::Utf8),
        ColumnSpec::renamed("sessionId", "session_id", DataType::Int64),
        ColumnSpec::renamed("location", "user_location", DataType::Utf8),
        ColumnSpec::renamed("userAgent", "user_agent", DataType::Utf8),
        ColumnSpec::kept("ts_year", DataType::Int32),
        ColumnSpec::kept("ts_month", DataType::Int32),
    ]
}

/// Song record columns the fact table keeps
pub fn songplay_song_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::kept("song_id", DataType::Utf8),
        ColumnSpec::kept("artist_id", DataType::Utf8),
    ]
}

/// Fact table column order
pub const SONGPLAY_COLUMNS: [&str; 11] = [
    "songplay_id",
    "start_time",
    "user_id",
    "user_level",
    "song_id",
    "artist_id",
    "session_id",
    "user_location",
    "user_agent",
    "ts_year",
    "ts_month",
];

fn schema_of(specs: &[ColumnSpec]) -> SchemaRef {
    Arc::new(Schema::new(
        specs.iter().map(ColumnSpec::field).collect::<Vec<_>>(),
    ))
}

/// Output schema of a star schema table
pub fn table_schema(table: StarTable) -> SchemaRef {
    match table {
        StarTable::Songs => schema_of(&song_columns()),
        StarTable::Artists => schema_of(&artist_columns()),
        StarTable::Users => schema_of(&user_columns()),
        StarTable::Time => Arc::new(Schema::new(time_fields())),
        StarTable::Songplays => {
            let mut fields = vec![Field::new("songplay_id", DataType::Int64, true)];
            let events = songplay_event_columns();
            let songs = songplay_song_columns();
            for name in &SONGPLAY_COLUMNS[1..] {
                let spec = events
                    .iter()
                    .chain(songs.iter())
                    .find(|spec| spec.name == *name);
                if let Some(spec) = spec {
                    fields.push(spec.field());
                }
            }
            Arc::new(Schema::new(fields))
        }
    }
}
