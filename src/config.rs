//! Pipeline configuration
//!
//! This module contains the configuration of one pipeline run, loaded from a
//! YAML file and optionally overridden from the command line.

use crate::error::{Error, Result};
use crate::output::ParquetWriterConfig;
use crate::storage::StorageOptions;
use crate::transform::TransformOptions;
use crate::types::{Compression, MatchStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Song files under the input root
pub const DEFAULT_SONG_DATA: &str = "song_data/*/*/*/*.json";

/// Log files under the input root
pub const DEFAULT_LOG_DATA: &str = "log_data/*/*/*.json";

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root holding the song and log files
    #[serde(default)]
    pub input_data: String,

    /// Root the five tables are written under
    #[serde(default)]
    pub output_data: String,

    /// Song file pattern relative to `input_data`
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Log file pattern relative to `input_data`
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// How play events are matched to songs
    #[serde(default)]
    pub match_strategy: MatchStrategy,

    /// Connection settings shared by input and output
    #[serde(default)]
    pub storage: StorageOptions,

    /// Parquet writer settings
    #[serde(default)]
    pub parquet: ParquetSettings,
}

fn default_song_data() -> String {
    DEFAULT_SONG_DATA.to_string()
}

fn default_log_data() -> String {
    DEFAULT_LOG_DATA.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_data: String::new(),
            output_data: String::new(),
            song_data: default_song_data(),
            log_data: default_log_data(),
            match_strategy: MatchStrategy::default(),
            storage: StorageOptions::default(),
            parquet: ParquetSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file, without validating it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML config text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Check that the config describes a runnable pipeline
    pub fn validate(&self) -> Result<()> {
        self.validate_inputs()?;
        if self.output_data.trim().is_empty() {
            return Err(Error::missing_field("output_data"));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Check only what reading the inputs needs
    pub fn validate_inputs(&self) -> Result<()> {
        if self.input_data.trim().is_empty() {
            return Err(Error::missing_field("input_data"));
        }
        if self.song_data.trim().is_empty() {
            return Err(Error::invalid_value("song_data", "pattern is empty"));
        }
        if self.log_data.trim().is_empty() {
            return Err(Error::invalid_value("log_data", "pattern is empty"));
        }
        Ok(())
    }

    /// Override the input root
    #[must_use]
    pub fn with_input(mut self, input_data: impl Into<String>) -> Self {
        self.input_data = input_data.into();
        self
    }

    /// Override the output root
    #[must_use]
    pub fn with_output(mut self, output_data: impl Into<String>) -> Self {
        self.output_data = output_data.into();
        self
    }

    /// Override the song file pattern
    #[must_use]
    pub fn with_song_data(mut self, pattern: impl Into<String>) -> Self {
        self.song_data = pattern.into();
        self
    }

    /// Override the log file pattern
    #[must_use]
    pub fn with_log_data(mut self, pattern: impl Into<String>) -> Self {
        self.log_data = pattern.into();
        self
    }

    /// Override the match strategy
    #[must_use]
    pub fn with_match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.match_strategy = strategy;
        self
    }

    /// Options for the transform stage
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            match_strategy: self.match_strategy,
        }
    }
}

// ============================================================================
// Parquet Settings
// ============================================================================

/// Parquet writer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParquetSettings {
    /// Compression codec
    #[serde(default)]
    pub compression: Compression,

    /// Maximum rows per row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    /// Dictionary encoding
    #[serde(default = "default_true")]
    pub dictionary: bool,

    /// Column statistics
    #[serde(default = "default_true")]
    pub statistics: bool,
}

impl Default for ParquetSettings {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
        }
    }
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

impl ParquetSettings {
    /// Writer config for these settings
    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_codec(self.compression)
            .with_row_group_size(self.row_group_size)
            .with_dictionary(self.dictionary)
            .with_statistics(self.statistics)
    }
}
