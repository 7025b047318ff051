//! Implementation of the `fuzzy-interp check` command.

use std::path::{Path, PathBuf};

use fuzzy_interp::{Catalog, EngineConfig};
use miette::{IntoDiagnostic, Report};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use super::{configuration_report, parse_catalog, read_source};

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Catalog files to check (.json)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one checked file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    interpretations: usize,
    evaluations: usize,
    properties: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn check_file(path: &Path) -> Result<Catalog, Report> {
    let content = read_source(path)?;
    let data = parse_catalog(path, &content)?;
    Catalog::build(data).map_err(|e| configuration_report(path, &content, e))
}

/// Run the check command.
///
/// Every file is checked even after a failure; the exit code is
/// `DATAERR` if any file is invalid.
pub fn run_check(args: CheckArgs, _config: EngineConfig) -> miette::Result<i32> {
    let mut reports = Vec::new();

    for path in &args.files {
        let file = path.display().to_string();
        match check_file(path) {
            Ok(catalog) => {
                let report = FileReport {
                    file,
                    valid: true,
                    interpretations: catalog.interpretations().count(),
                    evaluations: catalog.evaluations().count(),
                    properties: catalog.properties().count(),
                    error: None,
                };
                if !args.json {
                    println!(
                        "{} {}: {} interpretations, {} evaluations, {} properties",
                        "✓".if_supports_color(Stream::Stdout, |t| t.green()),
                        report.file,
                        report.interpretations,
                        report.evaluations,
                        report.properties
                    );
                }
                reports.push(report);
            }
            Err(e) => {
                if !args.json {
                    println!(
                        "{} {}",
                        "✗".if_supports_color(Stream::Stdout, |t| t.red()),
                        file
                    );
                    eprintln!("{e:?}");
                }
                reports.push(FileReport {
                    file,
                    valid: false,
                    interpretations: 0,
                    evaluations: 0,
                    properties: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.valid).count();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).into_diagnostic()?
        );
    } else if reports.len() > 1 {
        println!(
            "\n{} checked, {} failed",
            reports.len(),
            failed.if_supports_color(Stream::Stdout, |t| t.bold())
        );
    }

    if failed > 0 {
        Ok(exitcode::DATAERR)
    } else {
        Ok(exitcode::OK)
    }
}
