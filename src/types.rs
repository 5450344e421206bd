//! Common types used throughout sparkify-lake
//!
//! This module contains the table catalog of the star schema and the small
//! enums shared by configuration, transforms and output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Star Schema Tables
// ============================================================================

/// The five output tables of the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarTable {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl StarTable {
    /// All tables in write order
    pub const ALL: [StarTable; 5] = [
        StarTable::Songs,
        StarTable::Artists,
        StarTable::Users,
        StarTable::Time,
        StarTable::Songplays,
    ];

    /// Table name, also its subdirectory under the output root
    pub fn name(self) -> &'static str {
        match self {
            StarTable::Songs => "songs",
            StarTable::Artists => "artists",
            StarTable::Users => "users",
            StarTable::Time => "time",
            StarTable::Songplays => "songplays",
        }
    }

    /// Columns the table is physically partitioned by
    pub fn partition_columns(self) -> &'static [&'static str] {
        match self {
            StarTable::Songs => &["song_year", "artist_id"],
            StarTable::Time | StarTable::Songplays => &["ts_year", "ts_month"],
            StarTable::Artists | StarTable::Users => &[],
        }
    }

    /// Key column (unique per row)
    pub fn key_column(self) -> &'static str {
        match self {
            StarTable::Songs => "song_id",
            StarTable::Artists => "artist_id",
            StarTable::Users => "userId",
            StarTable::Time => "start_time",
            StarTable::Songplays => "songplay_id",
        }
    }
}

impl fmt::Display for StarTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StarTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StarTable::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown table '{s}'"))
    }
}

// ============================================================================
// Write Mode
// ============================================================================

/// How a table is written to its location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace everything under the location
    #[default]
    Overwrite,
    /// Refuse to write into a non-empty location
    ErrorIfExists,
}

// ============================================================================
// Match Strategy
// ============================================================================

/// How play events are matched to song records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// `song.title == event.song`
    #[default]
    Title,
    /// Title plus `song.artist_name == event.artist`
    TitleAndArtist,
}

// ============================================================================
// Compression
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_round_trip() {
        for table in StarTable::ALL {
            assert_eq!(table.name().parse::<StarTable>().unwrap(), table);
        }
        assert!("plays".parse::<StarTable>().is_err());
    }

    #[test]
    fn test_partition_columns() {
        assert_eq!(
            StarTable::Songs.partition_columns(),
            &["song_year", "artist_id"]
        );
        assert_eq!(
            StarTable::Songplays.partition_columns(),
            StarTable::Time.partition_columns()
        );
        assert!(StarTable::Users.partition_columns().is_empty());
    }

    #[test]
    fn test_serde_names() {
        let strategy: MatchStrategy = serde_json::from_str("\"title_and_artist\"").unwrap();
        assert_eq!(strategy, MatchStrategy::TitleAndArtist);

        let mode: WriteMode = serde_json::from_str("\"error_if_exists\"").unwrap();
        assert_eq!(mode, WriteMode::ErrorIfExists);

        let codec: Compression = serde_json::from_str("\"zstd\"").unwrap();
        assert_eq!(codec, Compression::Zstd);
    }
}
