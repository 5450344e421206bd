//! Time decomposer
//!
//! Epoch milliseconds are read as UTC. Weekdays are numbered 1 = Sunday
//! through 7 = Saturday; weeks are ISO-8601 weeks.

use super::columns::{append_columns, column, dedup_first, select};
use super::tables::{time_fields, PLAY_EVENTS, TIME_ZONE};
use crate::error::{Error, Result};
use arrow::array::{ArrayRef, AsArray, BooleanArray, Int32Array, TimestampMillisecondArray};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::sync::Arc;
use tracing::info;

/// Calendar fields of one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

/// Decompose epoch milliseconds; `None` outside chrono's range
pub fn decompose_timestamp(ts_ms: i64) -> Option<TimeParts> {
    let start_time = DateTime::<Utc>::from_timestamp_millis(ts_ms)?;
    Some(TimeParts {
        start_time,
        hour: start_time.hour() as i32,
        day: start_time.day() as i32,
        week: start_time.iso_week().week() as i32,
        month: start_time.month() as i32,
        year: start_time.year(),
        weekday: start_time.weekday().number_from_sunday() as i32,
    })
}

/// Append start_time and the calendar columns to play events
///
/// Events without a `ts` are dropped: they have no start_time to key on.
pub fn attach_time_columns(play_events: &RecordBatch) -> Result<RecordBatch> {
    let ts = cast(column(play_events, PLAY_EVENTS, "ts")?, &DataType::Int64)?;
    let present: BooleanArray = ts
        .as_primitive::<Int64Type>()
        .iter()
        .map(|v| Some(v.is_some()))
        .collect();
    let events = filter_record_batch(play_events, &present)?;

    let ts = cast(column(&events, PLAY_EVENTS, "ts")?, &DataType::Int64)?;
    let ts = ts.as_primitive::<Int64Type>();
    let n = ts.len();

    let mut start = Vec::with_capacity(n);
    let mut hour = Vec::with_capacity(n);
    let mut day = Vec::with_capacity(n);
    let mut week = Vec::with_capacity(n);
    let mut month = Vec::with_capacity(n);
    let mut year = Vec::with_capacity(n);
    let mut weekday = Vec::with_capacity(n);

    for &value in ts.values().iter() {
        let parts = decompose_timestamp(value).ok_or(Error::InvalidTimestamp { ts: value })?;
        start.push(parts.start_time.timestamp_millis());
        hour.push(parts.hour);
        day.push(parts.day);
        week.push(parts.week);
        month.push(parts.month);
        year.push(parts.year);
        weekday.push(parts.weekday);
    }

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(TimestampMillisecondArray::from(start).with_timezone(TIME_ZONE)),
        Arc::new(Int32Array::from(hour)),
        Arc::new(Int32Array::from(day)),
        Arc::new(Int32Array::from(week)),
        Arc::new(Int32Array::from(month)),
        Arc::new(Int32Array::from(year)),
        Arc::new(Int32Array::from(weekday)),
    ];

    append_columns(&events, time_fields(), arrays)
}

/// Time dimension: one row per distinct start_time
pub fn build_time_table(timed_events: &RecordBatch) -> Result<RecordBatch> {
    let names: Vec<String> = time_fields().iter().map(|f| f.name().clone()).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let time = select(timed_events, PLAY_EVENTS, &names)?;
    let time = dedup_first(&time, PLAY_EVENTS, "start_time")?;

    info!(
        play_events = timed_events.num_rows(),
        timestamps = time.num_rows(),
        "Built time table"
    );
    Ok(time)
}
