//! CLI entrypoint for hive-quorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod output;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, OutputFormat};
use colored::Colorize;
use hive_application::{
    CompositeObserver, ConsensusConfig, ConsensusObserver, CoordinatingAuthority, DecisionMemory,
};
use hive_domain::Severity;
use hive_infrastructure::{
    ConfigLoader, FileConfig, InMemoryDecisionMemory, JsonlDecisionMemory, JsonlEventLog, Scenario,
};
use output::ConsoleFormatter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| file_config.logging.log_file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    info!("Starting hive-quorum");

    let (config, warnings) = file_config.clone().into_validated()?;
    for issue in warnings.iter().filter(|i| i.severity == Severity::Warning) {
        eprintln!("{} {}", "Warning:".yellow().bold(), issue.message);
    }

    let scenario_path = cli
        .scenario
        .clone()
        .context("--scenario is required")?;
    let scenario = Scenario::load(&scenario_path)?;

    // === Dependency Injection ===
    let mut observer = CompositeObserver::default();
    if let Some(path) = cli
        .events
        .clone()
        .or_else(|| file_config.logging.events_path.clone())
    {
        match JsonlEventLog::new(&path) {
            Some(log) => observer.push(Arc::new(log)),
            None => warn!("Consensus events will not be logged"),
        }
    }
    let observer: Arc<dyn ConsensusObserver> = Arc::new(observer);

    match memory_path(&cli, &file_config) {
        Some(path) => {
            let memory = JsonlDecisionMemory::open(&path, Some(config.memory_retention_days))?;
            run(&cli, config, Arc::new(memory), observer, &scenario).await
        }
        None => {
            let memory =
                InMemoryDecisionMemory::new().with_retention_days(config.memory_retention_days);
            run(&cli, config, Arc::new(memory), observer, &scenario).await
        }
    }
}

fn memory_path(cli: &Cli, file_config: &FileConfig) -> Option<std::path::PathBuf> {
    cli.memory.clone().or_else(|| file_config.memory.path.clone())
}

/// Install the stderr subscriber, plus a non-blocking file layer if asked.
///
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let mut guard = None;
    let file_layer = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            std::fs::create_dir_all(directory)
                .with_context(|| format!("could not create {}", directory.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, file_guard) = tracing_appender::non_blocking(appender);
            guard = Some(file_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn run<M: DecisionMemory + 'static>(
    cli: &Cli,
    config: ConsensusConfig,
    memory: Arc<M>,
    observer: Arc<dyn ConsensusObserver>,
    scenario: &Scenario,
) -> Result<()> {
    let authority = CoordinatingAuthority::new(config, memory).with_observer(observer);
    for agent in scenario.agents() {
        authority.register_agent(agent);
    }

    let patterns = authority.initialize().await?;
    for pattern in &patterns {
        info!(
            "{} agreed with {} evaluated decisions, {:.0}% successful",
            pattern.agent_id,
            pattern.agreed_decisions,
            pattern.success_rate * 100.0
        );
    }

    let result = if cli.emergency {
        authority
            .handle_emergency(&scenario.topic, cli.severity, scenario.context.clone())
            .await
    } else {
        authority
            .make_decision(&scenario.topic, scenario.context.clone(), cli.urgency)
            .await
    };

    let health = authority.monitor_swarm_health().await;
    authority.engine().shutdown();

    let record = result?;
    match cli.output {
        OutputFormat::Text => {
            println!("{}", ConsoleFormatter::format(&record));
            println!("{}", ConsoleFormatter::format_health(&health));
        }
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&record)),
    }

    Ok(())
}
