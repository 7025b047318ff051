//! CLI command implementations.

mod batch;
mod check;
mod eval;
mod tree;

use std::fs::read_to_string;
use std::path::Path;

use fuzzy_interp::interpreter::parse_catalog_json;
use fuzzy_interp::{CatalogData, ConfigurationError, Engine, EngineConfig, EngineError};
use miette::{miette, IntoDiagnostic, Report, WrapErr};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::output::CatalogDiagnostic;

pub use batch::{run_batch, BatchArgs};
pub use check::{run_check, CheckArgs};
pub use eval::{run_eval, EvalArgs};
pub use tree::{run_tree, TreeArgs};

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> miette::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    debug!(path = %path.display(), "loading engine config");
    let content = read_source(path)?;
    EngineConfig::from_json(&content).map_err(|e| configuration_report(path, &content, e))
}

/// Read, parse and validate a catalog file into an engine.
pub fn open_engine(path: &Path, config: EngineConfig) -> miette::Result<Engine> {
    let content = read_source(path)?;
    let data = parse_catalog(path, &content)?;
    debug!(
        catalog = %path.display(),
        properties = data.properties.len(),
        evaluations = data.evaluations.len(),
        rules = data.rules.len(),
        "opening catalog"
    );
    Engine::from_data(data, config).map_err(|e| configuration_report(path, &content, e))
}

fn parse_catalog(path: &Path, content: &str) -> miette::Result<CatalogData> {
    parse_catalog_json(content, &path.display().to_string())
        .map_err(|e| configuration_report(path, content, e))
}

fn read_source(path: &Path) -> miette::Result<String> {
    read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))
}

/// Read a JSON file into `T`, naming `what` in the error.
fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> miette::Result<T> {
    let content = read_source(path)?;
    serde_json::from_str(&content)
        .map_err(|e| miette!("{}: invalid {what}: {e}", path.display()))
}

/// Turn a configuration error into a report, pointing into the source for
/// JSON errors.
fn configuration_report(path: &Path, content: &str, err: ConfigurationError) -> Report {
    match err {
        ConfigurationError::Json {
            line,
            column,
            message,
            ..
        } => CatalogDiagnostic::new(path, content, line, column, message).into(),
        other => miette!("{}: {}", path.display(), other),
    }
}

/// Exit code for an evaluation failure.
fn engine_exit_code(err: &EngineError) -> i32 {
    match err.status_code() {
        400 => exitcode::DATAERR,
        404 => exitcode::USAGE,
        _ => exitcode::SOFTWARE,
    }
}
