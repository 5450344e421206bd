//! Tests for transform module

use super::*;
use crate::error::ErrorKind;
use crate::source::records_to_batch;
use arrow::array::{Array, ArrayRef, AsArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Float64Type, Int32Type, Int64Type, TimestampMillisecondType};
use chrono::{Datelike, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use test_case::test_case;

// ============================================================================
// Fixtures
// ============================================================================

fn batch(records: &[Value]) -> RecordBatch {
    records_to_batch(records, None).unwrap()
}

fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str, duration: f64) -> Value {
    json!({
        "num_songs": 1,
        "song_id": song_id,
        "title": title,
        "artist_id": artist_id,
        "artist_name": artist_name,
        "artist_location": null,
        "artist_latitude": null,
        "artist_longitude": null,
        "year": 0,
        "duration": duration
    })
}

fn log(ts: i64, page: &str, song: &str, artist: &str, user: &str, level: &str) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Kaylee",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Summers",
        "length": 269.58322,
        "level": level,
        "location": "Phoenix-Mesa-Scottsdale, AZ",
        "method": "PUT",
        "page": page,
        "registration": 1540344794796_i64,
        "sessionId": 139,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Windows NT 6.1; WOW64)",
        "userId": user
    })
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(String::from))
        .collect()
}

fn ints(batch: &RecordBatch, name: &str) -> Vec<i32> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_primitive::<Int32Type>()
        .values()
        .to_vec()
}

const TS: i64 = 1_541_105_830_796;

// ============================================================================
// Song Extractor Tests
// ============================================================================

#[test]
fn test_songs_dedup_keeps_first() {
    let records = batch(&[
        song("X", "Song A", "AR1", "Artist", 100.0),
        song("X", "Song A", "AR1", "Artist", 222.5),
        song("Y", "Song B", "AR2", "Other", 50.0),
    ]);

    let tables = extract_songs(&records).unwrap();
    assert_eq!(tables.songs.num_rows(), 2);
    assert_eq!(
        strings(&tables.songs, "song_id"),
        vec![Some("X".to_string()), Some("Y".to_string())]
    );

    let duration = tables
        .songs
        .column_by_name("song_duration")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert!((duration.value(0) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_songs_schema_and_renames() {
    let records = batch(&[song("SOZCTXZ12AB0182364", "Setanta matilda", "AR5KOSW1187FB35FF4", "Elena", 269.58322)]);
    let tables = extract_songs(&records).unwrap();

    assert_eq!(tables.songs.schema(), table_schema(StarTable::Songs));
    assert_eq!(tables.artists.schema(), table_schema(StarTable::Artists));
    assert_eq!(
        strings(&tables.songs, "song_title"),
        vec![Some("Setanta matilda".to_string())]
    );
    assert_eq!(ints(&tables.songs, "song_year"), vec![0]);
}

#[test]
fn test_artists_dedup_and_null_passthrough() {
    let records = batch(&[
        song("S1", "One", "AR1", "Artist", 1.0),
        song("S2", "Two", "AR1", "Artist", 2.0),
        song("S3", "Three", "AR2", "Other", 3.0),
    ]);

    let artists = extract_songs(&records).unwrap().artists;
    assert_eq!(artists.num_rows(), 2);

    let latitude = artists.column_by_name("artist_latitude").unwrap();
    assert_eq!(latitude.data_type(), &DataType::Float64);
    assert_eq!(latitude.null_count(), 2);
}

#[test]
fn test_songs_missing_column_is_schema_error() {
    let records = batch(&[json!({"song_id": "S1", "title": "One", "artist_id": "AR1", "year": 2000})]);
    let err = extract_songs(&records).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert!(err.to_string().contains("duration"));
}

// ============================================================================
// Log Extractor Tests
// ============================================================================

#[test]
fn test_play_events_filter() {
    let records = batch(&[
        log(TS, "NextSong", "Setanta matilda", "Elena", "8", "free"),
        log(TS + 1, "Home", "", "", "8", "free"),
        log(TS + 2, "Login", "", "", "9", "paid"),
    ]);

    let plays = filter_play_events(&records).unwrap();
    assert_eq!(plays.num_rows(), 1);
    assert_eq!(strings(&plays, "song"), vec![Some("Setanta matilda".to_string())]);
    assert!(plays.column_by_name("page").is_none());
}

#[test]
fn test_users_include_non_play_pages() {
    let records = batch(&[
        log(TS, "NextSong", "Setanta matilda", "Elena", "8", "free"),
        log(TS + 1, "Home", "", "", "26", "free"),
    ]);

    let tables = extract_logs(&records).unwrap();
    assert_eq!(tables.play_events.num_rows(), 1);
    assert_eq!(
        strings(&tables.users, "userId"),
        vec![Some("8".to_string()), Some("26".to_string())]
    );
    assert_eq!(tables.users.schema(), table_schema(StarTable::Users));
}

#[test]
fn test_users_keep_most_recent_level() {
    let records = batch(&[
        log(TS + 10, "NextSong", "a", "b", "8", "paid"),
        log(TS, "Home", "", "", "8", "free"),
        log(TS + 5, "Home", "", "", "15", "free"),
    ]);

    let users = extract_users(&records).unwrap();
    assert_eq!(users.num_rows(), 2);
    assert_eq!(
        strings(&users, "user_level"),
        vec![Some("paid".to_string()), Some("free".to_string())]
    );
}

#[test]
fn test_users_numeric_ids_become_text() {
    let records = batch(&[json!({
        "userId": 8, "firstName": "K", "lastName": "S", "gender": "F",
        "level": "free", "ts": TS, "page": "Home"
    })]);

    let users = extract_users(&records).unwrap();
    assert_eq!(strings(&users, "userId"), vec![Some("8".to_string())]);
}

#[test]
fn test_dedup_latest_ties_keep_first() {
    let records = batch(&[
        json!({"k": "a", "t": 1, "v": "first"}),
        json!({"k": "a", "t": 1, "v": "second"}),
        json!({"k": "a", "t": null, "v": "third"}),
    ]);

    let out = dedup_latest(&records, "test", "k", "t").unwrap();
    assert_eq!(strings(&out, "v"), vec![Some("first".to_string())]);
}

#[test]
fn test_dedup_first_null_key_is_one_key() {
    let records = batch(&[
        json!({"k": null, "v": "a"}),
        json!({"k": null, "v": "b"}),
        json!({"k": "x", "v": "c"}),
    ]);

    let out = dedup_first(&records, "test", "k").unwrap();
    assert_eq!(
        strings(&out, "v"),
        vec![Some("a".to_string()), Some("c".to_string())]
    );
}

// ============================================================================
// Time Decomposer Tests
// ============================================================================

#[test]
fn test_decompose_known_timestamp() {
    let parts = decompose_timestamp(TS).unwrap();
    assert_eq!(
        parts.start_time,
        Utc.with_ymd_and_hms(2018, 11, 1, 20, 57, 10).unwrap() + chrono::Duration::milliseconds(796)
    );
    assert_eq!(parts.hour, 20);
    assert_eq!(parts.day, 1);
    assert_eq!(parts.week, 44);
    assert_eq!(parts.month, 11);
    assert_eq!(parts.year, 2018);
    assert_eq!(parts.weekday, 5);
}

#[test_case(1_541_289_600_000, 1 ; "sunday")]
#[test_case(1_541_376_000_000, 2 ; "monday")]
#[test_case(1_541_030_400_000, 5 ; "thursday")]
#[test_case(1_541_203_200_000, 7 ; "saturday")]
fn test_weekday_numbering(ts: i64, expected: i32) {
    assert_eq!(decompose_timestamp(ts).unwrap().weekday, expected);
}

#[test]
fn test_iso_week_at_year_boundary() {
    // 2021-01-01 belongs to ISO week 53 of 2020
    let parts = decompose_timestamp(1_609_459_200_000).unwrap();
    assert_eq!(parts.year, 2021);
    assert_eq!(parts.month, 1);
    assert_eq!(parts.week, 53);
}

#[test]
fn test_decompose_out_of_range() {
    assert!(decompose_timestamp(i64::MAX).is_none());
}

#[test]
fn test_attach_time_drops_missing_ts() {
    let records = batch(&[
        log(TS, "NextSong", "a", "b", "8", "free"),
        json!({"page": "NextSong", "song": "c", "artist": "d", "userId": "9",
               "level": "free", "sessionId": 1, "location": "x", "userAgent": "y", "ts": null}),
    ]);

    let plays = filter_play_events(&records).unwrap();
    assert_eq!(plays.num_rows(), 2);

    let timed = attach_time_columns(&plays).unwrap();
    assert_eq!(timed.num_rows(), 1);
    assert_eq!(timed.column_by_name("start_time").unwrap().data_type(), &start_time_type());
    assert_eq!(ints(&timed, "ts_hour"), vec![20]);
}

#[test]
fn test_attach_time_rejects_unrepresentable_ts() {
    let records = batch(&[log(i64::MAX, "NextSong", "a", "b", "8", "free")]);
    let plays = filter_play_events(&records).unwrap();
    assert!(matches!(
        attach_time_columns(&plays),
        Err(crate::error::Error::InvalidTimestamp { .. })
    ));
}

#[test]
fn test_time_table_distinct() {
    let records = batch(&[
        log(TS, "NextSong", "a", "b", "8", "free"),
        log(TS, "NextSong", "c", "d", "9", "free"),
        log(TS + 3_600_000, "NextSong", "a", "b", "8", "free"),
        log(TS + 7_200_000, "Home", "", "", "8", "free"),
    ]);

    let plays = filter_play_events(&records).unwrap();
    let timed = attach_time_columns(&plays).unwrap();
    let time = build_time_table(&timed).unwrap();

    assert_eq!(time.num_rows(), 2);
    assert_eq!(time.schema(), table_schema(StarTable::Time));
    assert_eq!(ints(&time, "ts_hour"), vec![20, 21]);
}

#[test]
fn test_zoned_timestamp_keys_are_epoch_millis() {
    let start: ArrayRef = Arc::new(
        TimestampMillisecondArray::from(vec![Some(TS), None, Some(TS)])
            .with_timezone(TIME_ZONE),
    );
    let keys = string_values(&start).unwrap();
    let keys: Vec<Option<&str>> = keys.iter().collect();
    assert_eq!(keys, vec![Some("1541105830796"), None, Some("1541105830796")]);

    let time = RecordBatch::try_from_iter(vec![("start_time", start)]).unwrap();
    let distinct = dedup_first(&time, "play event", "start_time").unwrap();
    assert_eq!(distinct.num_rows(), 2);
}

// ============================================================================
// Fact Builder Tests
// ============================================================================

fn songplays_for(
    logs: &[Value],
    songs: &[Value],
    strategy: MatchStrategy,
) -> RecordBatch {
    let plays = filter_play_events(&batch(logs)).unwrap();
    let timed = attach_time_columns(&plays).unwrap();
    build_songplays(&timed, &batch(songs), strategy, &mut SongplayIdGenerator::new()).unwrap()
}

#[test]
fn test_songplays_scenario() {
    let songplays = songplays_for(
        &[log(TS, "NextSong", "Setanta matilda", "Elena", "8", "free")],
        &[song(
            "SOZCTXZ12AB0182364",
            "Setanta matilda",
            "AR5KOSW1187FB35FF4",
            "Elena",
            269.58322,
        )],
        MatchStrategy::Title,
    );

    assert_eq!(songplays.num_rows(), 1);
    assert_eq!(songplays.schema(), table_schema(StarTable::Songplays));
    assert_eq!(
        strings(&songplays, "song_id"),
        vec![Some("SOZCTXZ12AB0182364".to_string())]
    );
    assert_eq!(
        strings(&songplays, "artist_id"),
        vec![Some("AR5KOSW1187FB35FF4".to_string())]
    );
    assert_eq!(strings(&songplays, "user_id"), vec![Some("8".to_string())]);
    assert_eq!(strings(&songplays, "user_level"), vec![Some("free".to_string())]);

    let session = songplays
        .column_by_name("session_id")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(session.value(0), 139);
}

#[test]
fn test_songplays_drop_unmatched_and_non_play() {
    let songplays = songplays_for(
        &[
            log(TS, "NextSong", "Unknown title", "Elena", "8", "free"),
            log(TS + 1, "Home", "Setanta matilda", "Elena", "8", "free"),
            log(TS + 2, "NextSong", "Setanta matilda", "Elena", "8", "free"),
        ],
        &[song("S1", "Setanta matilda", "AR1", "Elena", 1.0)],
        MatchStrategy::Title,
    );

    assert_eq!(songplays.num_rows(), 1);
    let start = songplays
        .column_by_name("start_time")
        .unwrap()
        .as_primitive::<TimestampMillisecondType>();
    assert_eq!(start.value(0), TS + 2);
}

#[test]
fn test_songplays_fan_out_on_shared_title() {
    let songs = [
        song("S1", "Intro", "AR1", "First", 1.0),
        song("S2", "Intro", "AR2", "Second", 2.0),
    ];
    let logs = [log(TS, "NextSong", "Intro", "Second", "8", "free")];

    let by_title = songplays_for(&logs, &songs, MatchStrategy::Title);
    assert_eq!(
        strings(&by_title, "song_id"),
        vec![Some("S1".to_string()), Some("S2".to_string())]
    );

    let by_artist = songplays_for(&logs, &songs, MatchStrategy::TitleAndArtist);
    assert_eq!(strings(&by_artist, "song_id"), vec![Some("S2".to_string())]);
}

#[test]
fn test_songplays_match_is_exact() {
    let songplays = songplays_for(
        &[log(TS, "NextSong", "setanta matilda", "Elena", "8", "free")],
        &[song("S1", "Setanta matilda", "AR1", "Elena", 1.0)],
        MatchStrategy::Title,
    );
    assert_eq!(songplays.num_rows(), 0);
    assert_eq!(songplays.schema(), table_schema(StarTable::Songplays));
}

#[test]
fn test_songplays_missing_song_column_names_song_records() {
    let plays = filter_play_events(&batch(&[log(TS, "NextSong", "Intro", "x", "8", "free")])).unwrap();
    let timed = attach_time_columns(&plays).unwrap();
    let songs = batch(&[json!({"song_id": "S1", "title": "Intro", "artist_name": "x"})]);

    let err = build_songplays(&timed, &songs, MatchStrategy::Title, &mut SongplayIdGenerator::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    assert_eq!(err.to_string(), "Column 'artist_id' not found in song records");
}

#[test]
fn test_songplay_ids_unique_and_increasing() {
    let logs: Vec<Value> = (0..5)
        .map(|i| log(TS + i, "NextSong", "Intro", "x", "8", "free"))
        .collect();
    let songplays = songplays_for(&logs, &[song("S1", "Intro", "AR1", "x", 1.0)], MatchStrategy::Title);

    let ids = songplays
        .column_by_name("songplay_id")
        .unwrap()
        .as_primitive::<Int64Type>()
        .values()
        .to_vec();
    assert_eq!(ids.len(), 5);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_id_generator_continues_across_calls() {
    let mut ids = SongplayIdGenerator::starting_at(10);
    assert_eq!(ids.next_ids(2).values().to_vec(), vec![10, 11]);
    assert_eq!(ids.next_ids(0).len(), 0);
    assert_eq!(ids.next_ids(1).values().to_vec(), vec![12]);
}

// ============================================================================
// Star Schema Tests
// ============================================================================

fn fixture() -> (RecordBatch, RecordBatch) {
    let songs = batch(&[
        song("SOZCTXZ12AB0182364", "Setanta matilda", "AR5KOSW1187FB35FF4", "Elena", 269.58322),
        song("SOUPIRU12A6D4FA1E1", "Der Kleine Dompfaff", "ARJIE2Y1187B994AB7", "Line Renaud", 152.92036),
        song("SOUPIRU12A6D4FA1E1", "Der Kleine Dompfaff", "ARJIE2Y1187B994AB7", "Line Renaud", 152.9),
    ]);
    let logs = batch(&[
        log(TS, "NextSong", "Setanta matilda", "Elena", "8", "free"),
        log(TS + 60_000, "NextSong", "Not in catalog", "Nobody", "8", "free"),
        log(1_543_622_400_000, "NextSong", "Setanta matilda", "Elena", "26", "paid"),
        log(TS + 120_000, "Home", "", "", "97", "paid"),
    ]);
    (songs, logs)
}

#[test]
fn test_star_schema_keys_unique() {
    let (songs, logs) = fixture();
    let star = build_star_schema(&songs, &logs, &TransformOptions::default()).unwrap();

    for (table, batch) in star.tables() {
        assert_eq!(batch.schema(), table_schema(table), "schema of {table}");
        let keys = string_values(batch.column_by_name(table.key_column()).unwrap()).unwrap();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), batch.num_rows(), "keys of {table}");
    }

    assert_eq!(star.songs.num_rows(), 2);
    assert_eq!(star.users.num_rows(), 3);
    assert_eq!(star.time.num_rows(), 3);
    assert_eq!(star.songplays.num_rows(), 2);
}

#[test]
fn test_star_schema_references() {
    let (songs, logs) = fixture();
    let star = build_star_schema(&songs, &logs, &TransformOptions::default()).unwrap();

    let time_keys: HashSet<i64> = star
        .time
        .column_by_name("start_time")
        .unwrap()
        .as_primitive::<TimestampMillisecondType>()
        .values()
        .iter()
        .copied()
        .collect();
    let song_keys: HashSet<Option<String>> = strings(&star.songs, "song_id").into_iter().collect();

    let start = star
        .songplays
        .column_by_name("start_time")
        .unwrap()
        .as_primitive::<TimestampMillisecondType>();
    let years = ints(&star.songplays, "ts_year");
    let months = ints(&star.songplays, "ts_month");

    for (i, song_id) in strings(&star.songplays, "song_id").into_iter().enumerate() {
        assert!(time_keys.contains(&start.value(i)));
        assert!(song_keys.contains(&song_id));

        let at = Utc.timestamp_millis_opt(start.value(i)).unwrap();
        assert_eq!(years[i], at.year());
        assert_eq!(months[i] as u32, at.month());
    }

    // the second matched play lands in December 2018
    assert_eq!(years, vec![2018, 2018]);
    assert_eq!(months, vec![11, 12]);
}

#[test]
fn test_star_schema_is_deterministic() {
    let (songs, logs) = fixture();
    let options = TransformOptions::default();
    let first = build_star_schema(&songs, &logs, &options).unwrap();
    let second = build_star_schema(&songs, &logs, &options).unwrap();

    for table in StarTable::ALL {
        assert_eq!(first.table(table), second.table(table), "{table}");
    }
}

#[test]
fn test_project_casts_and_renames() {
    let records = batch(&[json!({"year": 1999.0, "name": "x"})]);
    let out = project(
        &records,
        "test",
        &[
            ColumnSpec::renamed("year", "song_year", DataType::Int32),
            ColumnSpec::kept("name", DataType::Utf8),
        ],
    )
    .unwrap();
    assert_eq!(ints(&out, "song_year"), vec![1999]);
    assert_eq!(out.column(0).data_type(), &DataType::Int32);
}
