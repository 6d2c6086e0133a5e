//! Command-line argument definitions for the Limn CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, logging verbosity and the diagnostic modes.

use clap::Parser;

/// Command-line arguments for the Limn diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input JSON model
    #[arg(help = "Path to the input model (JSON)")]
    pub input: String,

    /// Path of the saved document; the extension is replaced by the session's
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log the draw commands instead of drawing and saving a document
    #[arg(long)]
    pub dry_run: bool,

    /// Log up to N templates of every loaded library
    #[arg(long, value_name = "N")]
    pub list_templates: Option<usize>,
}
