//! Pipeline module
//!
//! Runs the whole job: read both record sets, compute the star schema, write
//! every table.
//!
//! # Overview
//!
//! A run has two stages:
//! - `compute` - reads the inputs and builds all five tables in memory
//! - `materialize` - hands each table to a [`TableSink`] in write order
//!
//! Nothing is written until every table has been computed.

mod types;

pub use types::{InputSummary, Inputs, RunSummary, TableSummary};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::{ParquetSink, TableSink};
use crate::source::RecordSource;
use crate::transform::{build_star_schema, StarSchema};
use crate::types::WriteMode;
use std::time::Instant;
use tracing::{info, warn};

/// One configured pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline whose inputs are configured
    ///
    /// The output side is checked by [`Pipeline::run`], so computing and
    /// previewing work without an output root.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate_inputs()?;
        Ok(Self { config })
    }

    /// Get the config
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Open the input root
    pub fn source(&self) -> Result<RecordSource> {
        RecordSource::open(&self.config.input_data, &self.config.storage)
    }

    /// Open the output root
    pub fn sink(&self) -> Result<ParquetSink> {
        ParquetSink::open(
            &self.config.output_data,
            &self.config.storage,
            self.config.parquet.writer_config(),
        )
    }

    /// Read both record sets
    pub async fn read_inputs(&self) -> Result<Inputs> {
        let source = self.source()?;
        let song_records = source.read(&self.config.song_data).await?;
        let log_records = source.read(&self.config.log_data).await?;
        Ok(Inputs {
            song_records,
            log_records,
        })
    }

    /// Compute stage: every table, nothing written
    pub async fn compute(&self) -> Result<StarSchema> {
        let inputs = self.read_inputs().await?;
        self.transform(&inputs)
    }

    /// Build the star schema from already read inputs
    pub fn transform(&self, inputs: &Inputs) -> Result<StarSchema> {
        build_star_schema(
            &inputs.song_records,
            &inputs.log_records,
            &self.config.transform_options(),
        )
    }

    /// Materialize stage: write every table, in order
    pub async fn materialize(
        &self,
        schema: &StarSchema,
        sink: &dyn TableSink,
    ) -> Result<Vec<TableSummary>> {
        let mut summaries = Vec::new();
        for (table, batch) in schema.tables() {
            let partition_columns = table.partition_columns();
            let write = sink
                .write_table(batch, table.name(), partition_columns, WriteMode::Overwrite)
                .await?;
            summaries.push(TableSummary {
                table,
                partition_columns: partition_columns.iter().map(|c| (*c).to_string()).collect(),
                write,
            });
        }
        Ok(summaries)
    }

    /// Run both stages against the configured output
    pub async fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let start = Instant::now();
        info!(
            input = %self.config.input_data,
            output = %self.config.output_data,
            "Starting pipeline"
        );

        let inputs = self.read_inputs().await?;
        let schema = self.transform(&inputs)?;

        let sink = self.sink()?;
        let tables = self.materialize(&schema, &sink).await?;

        let summary = RunSummary {
            input: self.config.input_data.clone(),
            output: self.config.output_data.clone(),
            song_records: inputs.song_records.num_rows(),
            log_records: inputs.log_records.num_rows(),
            tables,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            rows = summary.total_rows(),
            duration_ms = summary.duration_ms,
            "Pipeline finished"
        );
        Ok(summary)
    }

    /// List the files each input pattern selects, without reading them
    pub async fn inspect_inputs(&self) -> Result<InputSummary> {
        let source = self.source()?;
        let song_files = source.list(&self.config.song_data).await?.len();
        let log_files = source.list(&self.config.log_data).await?.len();

        let summary = InputSummary {
            input: self.config.input_data.clone(),
            song_data: self.config.song_data.clone(),
            song_files,
            log_data: self.config.log_data.clone(),
            log_files,
        };
        if !summary.is_complete() {
            warn!(song_files, log_files, "An input pattern matches no files");
        }
        Ok(summary)
    }
}
