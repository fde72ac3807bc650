//! CLI argument parsing for qualforge.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::logging::LogFormat;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "qualforge.yaml";

/// Qualforge: scaffold quality infrastructure for new projects.
///
/// Build scripts and policy documents are rendered from templates; CI
/// workflows, metrics configuration, hooks and the quality guide are
/// generated by an LLM and validated before they are written.
#[derive(Parser, Debug)]
#[command(name = "qualforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for qualforge.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the generation pipeline against the target directory.
    ///
    /// Validates the whole plan first, then runs every enabled generator and
    /// prints a per-generator summary.
    Generate(GenerateArgs),

    /// Validate the config and the pipeline plan without generating anything.
    ///
    /// Needs no API key and makes no network calls.
    Check(CheckArgs),

    /// Adapt an existing file to a new context with a single model call.
    Tune(TuneArgs),

    /// Write a config file populated with defaults.
    InitConfig(InitConfigArgs),
}

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override `project.target_dir`.
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Run independent generators in parallel.
    #[arg(long)]
    pub concurrent: bool,

    /// Report what would be written without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip appending to the run journal.
    #[arg(long)]
    pub no_journal: bool,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// Arguments for the `tune` command.
#[derive(Args, Debug)]
pub struct TuneArgs {
    /// File whose content should be adapted.
    pub file: PathBuf,

    /// Free-text description of the new context.
    #[arg(long)]
    pub target_context: String,

    /// Path to the config file (model settings only).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Model to use instead of `model.tune_model`.
    #[arg(long)]
    pub model: Option<String>,

    /// Overwrite the file with the tuned content instead of printing it.
    #[arg(long)]
    pub write: bool,
}

/// Arguments for the `init-config` command.
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Project name to put in the config.
    #[arg(long)]
    pub name: Option<String>,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
