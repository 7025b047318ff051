//! Implementation of the `fuzzy-interp eval` command.

use std::path::PathBuf;

use fuzzy_interp::{EngineConfig, PropertyData, PropertyValue};
use miette::IntoDiagnostic;

use super::{engine_exit_code, open_engine, read_json};
use crate::output::table::{format_node_table, format_property_table, node_labels};
use crate::output::{format_rating, paint_class};

/// Arguments for the eval command.
#[derive(Debug, clap::Args)]
pub struct EvalArgs {
    /// Catalog file (.json)
    #[arg(long, required = true)]
    pub catalog: PathBuf,

    /// Interpretation name
    pub interpretation: String,

    /// Property values in name=value format (repeatable)
    #[arg(short = 'p', long = "property", value_parser = parse_key_val)]
    pub properties: Vec<(String, String)>,

    /// JSON object of property values; `-p` entries override it
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse a key=value property string.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid property format '{s}': expected name=value"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Numbers become numeric values, `null` becomes null, anything else text.
fn parse_value(raw: &str) -> PropertyValue {
    if raw.eq_ignore_ascii_case("null") {
        return PropertyValue::Null;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => PropertyValue::Number(n),
        Ok(_) | Err(_) => PropertyValue::Text(raw.to_string()),
    }
}

/// Run the eval command.
pub fn run_eval(args: EvalArgs, config: EngineConfig) -> miette::Result<i32> {
    let engine = open_engine(&args.catalog, config)?;

    let mut data = match &args.data {
        Some(path) => read_json(path, "property data")?,
        None => PropertyData::new(),
    };
    data.extend(
        args.properties
            .iter()
            .map(|(name, raw)| (name.clone(), parse_value(raw))),
    );

    let result = match engine.evaluate(&args.interpretation, &data) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                let output = serde_json::json!({ "error": e.to_string() });
                eprintln!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
            } else {
                eprintln!("Evaluation error: {e}");
            }
            return Ok(engine_exit_code(&e));
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(result.as_ref()).into_diagnostic()?
        );
        return Ok(exitcode::OK);
    }

    println!(
        "{}: {} ({})",
        result.interpretation,
        format_rating(result.rating),
        paint_class(result.rating_class)
    );

    let tree = engine.rule_tree(&args.interpretation).into_diagnostic()?;
    println!("{}", format_node_table(&result, &node_labels(&tree)));
    if !result.property_values.is_empty() {
        println!("{}", format_property_table(&result.property_values));
    }
    Ok(exitcode::OK)
}
