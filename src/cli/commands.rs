//! CLI commands and argument parsing

use crate::types::{MatchStrategy, StarTable};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sparkify data lake builder
#[derive(Parser, Debug)]
#[command(name = "sparkify-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Location and matching overrides shared by commands that read input
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Input root (local path or cloud URL)
    /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long)]
    pub input: Option<String>,

    /// Song file pattern relative to the input root
    #[arg(long)]
    pub song_data: Option<String>,

    /// Log file pattern relative to the input root
    #[arg(long)]
    pub log_data: Option<String>,

    /// How play events are matched to songs
    #[arg(long, value_enum)]
    pub match_strategy: Option<MatchStrategy>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the star schema and write it to the output root
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Output root (local path or cloud URL)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check the configuration and count input files, writing nothing
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output root (local path or cloud URL)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print output table schemas
    Schema {
        /// Only this table
        #[arg(long)]
        table: Option<StarTable>,
    },

    /// Compute the star schema in memory and print rows of one table
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Table to print
        #[arg(long)]
        table: StarTable,

        /// Maximum rows to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}
