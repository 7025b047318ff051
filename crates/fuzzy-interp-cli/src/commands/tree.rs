//! Implementation of the `fuzzy-interp tree` command.

use std::path::PathBuf;

use fuzzy_interp::types::render_outline;
use fuzzy_interp::EngineConfig;

use super::{engine_exit_code, open_engine};
use crate::output::table::{format_interpretation_table, format_required_table};

/// Arguments for the tree command.
#[derive(Debug, clap::Args)]
pub struct TreeArgs {
    /// Catalog file (.json)
    #[arg(long, required = true)]
    pub catalog: PathBuf,

    /// Interpretation to show; lists all interpretations when omitted
    pub interpretation: Option<String>,
}

/// Run the tree command.
pub fn run_tree(args: TreeArgs, config: EngineConfig) -> miette::Result<i32> {
    let engine = open_engine(&args.catalog, config)?;

    let Some(name) = args.interpretation else {
        let catalog = engine.catalog();
        println!("{}", format_interpretation_table(catalog.interpretations()));
        return Ok(exitcode::OK);
    };

    let lookup = engine
        .rule_tree(&name)
        .and_then(|tree| engine.required_properties(&name).map(|required| (tree, required)));
    let (tree, required) = match lookup {
        Ok(found) => found,
        Err(e) => {
            eprintln!("{e}");
            return Ok(engine_exit_code(&e));
        }
    };

    print!("{}", render_outline(&tree));
    if !required.is_empty() {
        println!("\n{}", format_required_table(&required));
    }
    Ok(exitcode::OK)
}
