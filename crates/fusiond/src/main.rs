//! fusiond - run one sensor fusion and print the report
//!
//! Loads configuration (TOML file, then `FUSION_*` environment, then flags),
//! discovers the configured agents over HTTP, fuses their readings for one
//! sector and writes the report to stdout as pretty JSON. Ctrl-C cancels the
//! run and every in-flight agent call.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};

use fusion_core::metrics::METRICS;
use fusion_core::{cancel_pair, AgentEndpoint, FusionConfig, FusionOrchestrator};

#[derive(Parser)]
#[command(name = "fusiond")]
#[command(author = "Stevedores Org")]
#[command(version = fusion_core::VERSION)]
#[command(about = "Fuse radar and visual agent readings into one target report", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "FUSION_CONFIG")]
    config: Option<PathBuf>,

    /// Sector to run the fusion for
    #[arg(short, long, default_value = "Alpha Sector")]
    sector: String,

    /// Agent as id=url or id=url|skill; repeat to replace the configured agents
    #[arg(short, long = "agent")]
    agents: Vec<String>,

    /// Per-agent dispatch timeout in seconds
    #[arg(long)]
    dispatch_timeout_secs: Option<u64>,

    /// Task priority, 1 to 10
    #[arg(long)]
    priority: Option<u8>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<FusionConfig> {
    let mut config = match &cli.config {
        Some(path) => FusionConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FusionConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid FUSION_* environment override")?;

    if !cli.agents.is_empty() {
        config.agents = cli
            .agents
            .iter()
            .map(|entry| AgentEndpoint::parse(entry))
            .collect::<Result<_, _>>()
            .context("Invalid --agent")?;
    }
    if let Some(secs) = cli.dispatch_timeout_secs {
        config.dispatch_timeout_secs = secs;
    }
    if let Some(priority) = cli.priority {
        config.priority = priority;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    fusion_core::init_tracing(cli.json, level);

    let config = load_config(&cli)?;
    info!(agents = config.agents.len(), sector = %cli.sector, "starting fusion");

    let orchestrator =
        FusionOrchestrator::with_http(config).context("Failed to build orchestrator")?;

    let discovery = orchestrator.discover().await;
    for (agent_id, err) in &discovery.failures {
        warn!(agent_id = %agent_id, error = %err, "agent unavailable");
    }

    let (cancel, token) = cancel_pair();
    let run = orchestrator.run_with_cancel(&cli.sector, &token);
    tokio::pin!(run);

    let result = tokio::select! {
        res = &mut run => res,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, cancelling agent calls");
            cancel.cancel();
            run.await
        }
    };

    orchestrator.shutdown().await;
    METRICS.flush();

    let report = result.context("Fusion run failed")?;
    if report.is_rejected() {
        warn!(fusion_id = %report.fusion_id, "report flagged REJECT by validator");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}
