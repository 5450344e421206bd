//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - Build the star schema and write it out
//! - `validate` - Check the config and count input files
//! - `schema` - Print the output table schemas
//! - `preview` - Print the first rows of one computed table

mod commands;
mod runner;

pub use commands::{Cli, Commands, InputArgs};
pub use runner::{apply_overrides, json_lines, schema_json, Runner};
