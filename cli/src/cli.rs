//! CLI command definitions

use clap::{Parser, ValueEnum};
use hive_domain::{EmergencySeverity, Urgency};
use std::path::PathBuf;

/// Output format for the decision record
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// The full decision record as JSON
    Json,
}

/// CLI arguments for hive-quorum
#[derive(Parser, Debug)]
#[command(name = "hive-quorum")]
#[command(author, version, about = "Run a weighted-quorum decision cycle over scripted workers")]
#[command(long_about = r#"
hive-quorum drives one decision cycle of the consensus subsystem.

Scripted workers from the scenario file report on its topic, the reports are
turned into ballot options, every worker votes, and the coordinating
authority records the outcome. A round that misses quorum is reported as
DEFERRED, never as decided.

Configuration files are loaded from (in priority order):
1. HIVE_* environment variables (e.g. HIVE_CONSENSUS__VOTING_THRESHOLD=0.6)
2. --config <path>     Explicit config file
3. ./hive.toml         Project-level config
4. ~/.config/hive-quorum/config.toml   Global config

Example:
  hive-quorum --scenario expansion.toml
  hive-quorum --scenario outage.toml --emergency --severity critical
  hive-quorum --scenario expansion.toml --memory decisions.jsonl --events events.jsonl -v
"#)]
pub struct Cli {
    /// Scenario file describing the topic and the scripted workers
    #[arg(short, long, value_name = "PATH", required_unless_present = "show_config")]
    pub scenario: Option<PathBuf>,

    /// Run an emergency cycle instead of an ordinary decision
    #[arg(short, long)]
    pub emergency: bool,

    /// Emergency severity (low, medium, high, critical)
    #[arg(long, default_value = "high")]
    pub severity: EmergencySeverity,

    /// Urgency of an ordinary decision (low, normal, high, critical)
    #[arg(long, default_value = "normal")]
    pub urgency: Urgency,

    /// JSONL decision memory (overrides [memory] path)
    #[arg(long, value_name = "PATH")]
    pub memory: Option<PathBuf>,

    /// Append consensus events to this JSONL file (overrides [logging] events_path)
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Also write diagnostics to this file (overrides [logging] log_file)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
