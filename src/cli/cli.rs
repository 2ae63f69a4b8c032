use std::path::PathBuf;

use clap::Parser;

use crate::application::data::{ColorChoice, LogLevel};

/// Runs a YAML script of operations against an in-memory file tree.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// The script to run
    pub script: PathBuf,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Do not check the tree invariants after each step
    #[clap(long)]
    pub skip_validation: bool,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}
