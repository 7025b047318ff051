//! Implementation of the `fuzzy-interp batch` command.

use std::path::PathBuf;

use fuzzy_interp::{EngineConfig, PropertyData};
use miette::IntoDiagnostic;
use serde::Serialize;

use super::{open_engine, read_json};
use crate::output::table::{format_batch_table, BatchRow};

/// Arguments for the batch command.
#[derive(Debug, clap::Args)]
pub struct BatchArgs {
    /// Catalog file (.json)
    #[arg(long, required = true)]
    pub catalog: PathBuf,

    /// Interpretation name
    pub interpretation: String,

    /// JSON array of property-value objects, one per record
    pub records: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordJson {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the batch command.
///
/// A failing record is reported in place and does not stop the others; the
/// exit code is `DATAERR` if any record failed.
pub fn run_batch(args: BatchArgs, config: EngineConfig) -> miette::Result<i32> {
    let engine = open_engine(&args.catalog, config)?;
    let records: Vec<PropertyData> = read_json(&args.records, "records")?;

    let results = engine.batch_evaluate(&args.interpretation, &records);
    let failed = results.iter().filter(|r| r.is_err()).count();

    if args.json {
        let output: Vec<RecordJson> = results
            .iter()
            .enumerate()
            .map(|(index, result)| match result {
                Ok(r) => RecordJson {
                    index,
                    rating: r.rating,
                    rating_class: Some(r.rating_class.to_string()),
                    error: None,
                },
                Err(e) => RecordJson {
                    index,
                    rating: None,
                    rating_class: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        let rows: Vec<BatchRow<'_>> = results
            .iter()
            .enumerate()
            .map(|(index, result)| BatchRow { index, result })
            .collect();
        println!("{}", format_batch_table(&rows));
        println!("\n{} records, {} failed", results.len(), failed);
    }

    if failed > 0 {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
