use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::BackendKind;
use crate::paths::ENV_JSONNET;

#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Evaluate Jsonnet environments and reconcile them against target systems", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate Jsonnet and print the resulting JSON
    Eval(EvalArgs),

    /// Print the provider's normalized form of an environment
    Show(EnvArgs),

    /// Preview what apply would change
    Diff(EnvArgs),

    /// Make the target system match an environment
    Apply(ApplyArgs),

    /// List registered providers
    Providers,
}

// ============================================================================
// Evaluation flags
// ============================================================================

/// Flags shared by every command that evaluates templates
#[derive(Args, Default)]
pub struct EvaluationArgs {
    /// Additional import search root (first listed wins)
    #[arg(short = 'J', long = "jpath", value_name = "DIR")]
    pub jpath: Vec<String>,

    /// External variable as code
    #[arg(long = "ext-code", value_name = "NAME=CODE", value_parser = parse_variable)]
    pub ext_code: Vec<(String, String)>,

    /// Top-level argument as code
    #[arg(long = "tla-code", value_name = "NAME=CODE", value_parser = parse_variable)]
    pub tla_code: Vec<(String, String)>,

    /// Recursion bound (0 keeps the interpreter default)
    #[arg(long, value_name = "N")]
    pub max_stack: Option<usize>,

    /// Evaluation backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Jsonnet interpreter for the binary backend
    #[arg(long, env = ENV_JSONNET, value_name = "PATH")]
    pub jsonnet: Option<PathBuf>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args)]
pub struct EvalArgs {
    /// Evaluate this code instead of files
    #[arg(
        short = 'e',
        long = "exec",
        value_name = "CODE",
        conflicts_with = "files",
        allow_hyphen_values = true
    )]
    pub exec: Option<String>,

    /// Files to evaluate
    #[arg(required_unless_present = "exec")]
    pub files: Vec<PathBuf>,

    /// Number of parallel evaluations
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    #[command(flatten)]
    pub evaluation: EvaluationArgs,
}

#[derive(Args)]
pub struct EnvArgs {
    /// Environment directory holding main.jsonnet and strata.toml
    #[arg(default_value = ".")]
    pub env: PathBuf,

    #[command(flatten)]
    pub evaluation: EvaluationArgs,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub auto_approve: bool,
}

/// Parse `NAME=CODE`, splitting at the first `=`
fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .ok_or_else(|| format!("expected NAME=CODE, got '{raw}'"))
}
