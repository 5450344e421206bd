//! Error types for sparkify-lake
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every error is fatal for a run; [`Error::kind`] groups variants into the
//! categories the CLI reports.

use thiserror::Error;

/// The main error type for sparkify-lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Failed to read '{location}': {message}")]
    SourceRead { location: String, message: String },

    #[error("No input files match '{pattern}'")]
    NoInputFiles { pattern: String },

    #[error("Failed to decode {path} at line {line}: {message}")]
    Decode {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Column '{column}' not found in {table} records")]
    MissingColumn { table: String, column: String },

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error("Timestamp {ts} is outside the supported range")]
    InvalidTimestamp { ts: i64 },

    #[error("Transform error: {message}")]
    Transform { message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Failed to write '{location}': {message}")]
    Write { location: String, message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Error categories, one per failure mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration or location
    Config,
    /// Input could not be listed, read or decoded
    SourceRead,
    /// A projected column is absent from the record set
    SchemaMismatch,
    /// Output could not be encoded or stored
    Write,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Process exit code for this category
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::Config => 2,
            ErrorKind::SourceRead => 3,
            ErrorKind::SchemaMismatch => 4,
            ErrorKind::Write => 5,
        }
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source read error
    pub fn source_read(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create a missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a transform error
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::InvalidUrl(_) => ErrorKind::Config,
            Error::SourceRead { .. }
            | Error::NoInputFiles { .. }
            | Error::Decode { .. }
            | Error::JsonParse(_) => ErrorKind::SourceRead,
            Error::MissingColumn { .. } => ErrorKind::SchemaMismatch,
            Error::Parquet(_) | Error::Write { .. } | Error::ObjectStore(_) => ErrorKind::Write,
            _ => ErrorKind::Internal,
        }
    }
}

/// Result type alias for sparkify-lake
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("input_data");
        assert_eq!(err.to_string(), "Missing required config field: input_data");

        let err = Error::missing_column("song", "title");
        assert_eq!(err.to_string(), "Column 'title' not found in song records");

        let err = Error::NoInputFiles {
            pattern: "log_data/*.json".to_string(),
        };
        assert_eq!(err.to_string(), "No input files match 'log_data/*.json'");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
        assert_eq!(
            Error::source_read("s3://bucket", "denied").kind(),
            ErrorKind::SourceRead
        );
        assert_eq!(
            Error::missing_column("log", "page").kind(),
            ErrorKind::SchemaMismatch
        );
        assert_eq!(Error::write("out/songs", "full").kind(), ErrorKind::Write);
        assert_eq!(Error::InvalidTimestamp { ts: 0 }.kind(), ErrorKind::Internal);

        let broken_pipe = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err = Error::from(broken_pipe);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "IO error: stdout closed");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ErrorKind::Internal,
            ErrorKind::Config,
            ErrorKind::SourceRead,
            ErrorKind::SchemaMismatch,
            ErrorKind::Write,
        ]
        .map(ErrorKind::exit_code);
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c != 0));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
