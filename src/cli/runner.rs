//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, InputArgs};
use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::pipeline::Pipeline;
use crate::transform::table_schema;
use crate::types::{JsonObject, JsonValue, StarTable};
use arrow::json::LineDelimitedWriter;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { input, output } => self.run_pipeline(input, output.as_deref()).await,
            Commands::Validate { input, output } => self.validate(input, output.as_deref()).await,
            Commands::Schema { table } => self.schema(*table),
            Commands::Preview {
                input,
                table,
                limit,
            } => self.preview(input, *table, *limit).await,
        }
    }

    /// Load configuration, or start from defaults without a file
    fn load_config(&self) -> Result<PipelineConfig> {
        match &self.cli.config {
            Some(path) => {
                info!(path = %path.display(), "Loading config");
                PipelineConfig::from_file(path)
            }
            None => Ok(PipelineConfig::default()),
        }
    }

    /// Config file with command-line overrides applied
    fn configure(&self, input: &InputArgs, output: Option<&str>) -> Result<PipelineConfig> {
        Ok(apply_overrides(self.load_config()?, input, output))
    }

    /// Full pipeline
    async fn run_pipeline(&self, input: &InputArgs, output: Option<&str>) -> Result<()> {
        let config = self.configure(input, output)?;
        let summary = Pipeline::new(config)?.run().await?;
        self.output_message(&summary)
    }

    /// Check config and count input files
    async fn validate(&self, input: &InputArgs, output: Option<&str>) -> Result<()> {
        let config = self.configure(input, output)?;
        config.validate()?;

        let summary = Pipeline::new(config)?.inspect_inputs().await?;
        self.output_message(&json!({
            "valid": summary.is_complete(),
            "inputs": summary,
        }))
    }

    /// Print output schemas
    fn schema(&self, table: Option<StarTable>) -> Result<()> {
        let tables: Vec<StarTable> = match table {
            Some(table) => vec![table],
            None => StarTable::ALL.to_vec(),
        };
        for table in tables {
            self.output_message(&schema_json(table))?;
        }
        Ok(())
    }

    /// Compute in memory and print the head of one table
    async fn preview(&self, input: &InputArgs, table: StarTable, limit: usize) -> Result<()> {
        let config = self.configure(input, None)?;
        let schema = Pipeline::new(config)?.compute().await?;

        let batch = schema.table(table);
        let head = batch.slice(0, limit.min(batch.num_rows()));
        write!(std::io::stdout().lock(), "{}", json_lines(&head)?)?;
        Ok(())
    }

    /// Output a message
    fn output_message<T: Serialize>(&self, msg: &T) -> Result<()> {
        let line = if self.cli.verbose {
            serde_json::to_string_pretty(msg)
        } else {
            serde_json::to_string(msg)
        }
        .context("Failed to serialize output")?;
        writeln!(std::io::stdout().lock(), "{line}")?;
        Ok(())
    }
}

/// Apply command-line overrides on top of a loaded config
pub fn apply_overrides(
    mut config: PipelineConfig,
    input: &InputArgs,
    output: Option<&str>,
) -> PipelineConfig {
    if let Some(root) = &input.input {
        config = config.with_input(root.as_str());
    }
    if let Some(root) = output {
        config = config.with_output(root);
    }
    if let Some(pattern) = &input.song_data {
        config = config.with_song_data(pattern.as_str());
    }
    if let Some(pattern) = &input.log_data {
        config = config.with_log_data(pattern.as_str());
    }
    if let Some(strategy) = input.match_strategy {
        config = config.with_match_strategy(strategy);
    }
    config
}

/// One table's layout as JSON
pub fn schema_json(table: StarTable) -> JsonValue {
    let fields: Vec<JsonValue> = table_schema(table)
        .fields()
        .iter()
        .map(|field| {
            let mut object = JsonObject::new();
            object.insert("name".to_string(), json!(field.name()));
            object.insert("type".to_string(), json!(field.data_type().to_string()));
            object.insert("nullable".to_string(), json!(field.is_nullable()));
            JsonValue::Object(object)
        })
        .collect();

    json!({
        "table": table.name(),
        "key": table.key_column(),
        "partition_columns": table.partition_columns(),
        "fields": fields,
    })
}

/// Rows of a batch as newline-delimited JSON
pub fn json_lines(batch: &RecordBatch) -> Result<String> {
    let mut writer = LineDelimitedWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
