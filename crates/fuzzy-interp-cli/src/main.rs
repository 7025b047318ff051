//! fuzzy-interp CLI entry point.
//!
//! Provides command-line tools for working with interpretation catalogs:
//! - `fuzzy-interp check` - Validate catalog files
//! - `fuzzy-interp eval` - Evaluate one interpretation for one record
//! - `fuzzy-interp batch` - Evaluate one interpretation for many records
//! - `fuzzy-interp tree` - Show normalized rule trees

mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    load_config, run_batch, run_check, run_eval, run_tree, BatchArgs, CheckArgs, EvalArgs,
    TreeArgs,
};
use tracing_subscriber::EnvFilter;

/// Fuzzy interpretation catalog tools.
#[derive(Debug, Parser)]
#[command(name = "fuzzy-interp")]
#[command(about = "Fuzzy interpretation catalog tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Enable verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "FUZZY_INTERP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate catalog files
    Check(CheckArgs),
    /// Evaluate an interpretation for one record
    Eval(EvalArgs),
    /// Evaluate an interpretation for a JSON array of records
    Batch(BatchArgs),
    /// Print normalized rule trees and required properties
    Tree(TreeArgs),
}

/// Set up color output based on user preference.
fn setup_colors(color_when: ColorWhen) {
    match color_when {
        ColorWhen::Auto => {
            // owo-colors automatically checks TTY, NO_COLOR, FORCE_COLOR
        }
        ColorWhen::Always => {
            owo_colors::set_override(true);
        }
        ColorWhen::Never => {
            owo_colors::set_override(false);
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn setup_tracing(verbose: bool) {
    let fallback = if verbose { "fuzzy_interp=debug,fuzzy_interp_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_colors(cli.color);
    setup_tracing(cli.verbose);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Check(args) => run_check(args, config),
        Commands::Eval(args) => run_eval(args, config),
        Commands::Batch(args) => run_batch(args, config),
        Commands::Tree(args) => run_tree(args, config),
    });

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
