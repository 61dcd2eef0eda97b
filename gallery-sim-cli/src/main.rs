use anyhow::{Context, Result};
use clap::Parser;
use gallery_sim_config::{ConfigLoader, SimulatorConfig};
use gallery_sim_core::{
    stdout_report_sink, ActionExecutor, CycleOrchestrator, Endpoints, ImageCatalog,
    OrchestratorSettings, RegexLinkExtractor, ReportSink, StatCounters, StatsReport,
};
use gallery_sim_http::{ConnectionPool, ConnectionPoolConfig, HttpTransport};
use gallery_sim_logging::init_logging_from_config;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod cli;
use cli::Cli;

/// Load file and environment layers, apply flags, then validate
fn load_config(cli: &Cli) -> Result<SimulatorConfig> {
    let loader = ConfigLoader::new();

    let mut config = match &cli.config {
        Some(path) => loader
            .load_unvalidated(Some(path))
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => loader
            .load_unvalidated(None::<&std::path::Path>)
            .context("Failed to load configuration from environment")?,
    };

    cli.apply_overrides(&mut config)
        .context("Invalid command-line arguments")?;
    config.validate_all().context("Invalid configuration")?;

    Ok(config)
}

/// Cancel `shutdown` on Ctrl+C
fn watch_for_interrupt(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, stopping simulation");
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });
}

fn print_json(report: &StatsReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn report_sink(json_report: bool) -> ReportSink {
    if json_report {
        Arc::new(|report: &StatsReport| {
            if let Err(e) = print_json(report) {
                error!("{:#}", e);
            }
        })
    } else {
        stdout_report_sink()
    }
}

async fn run(config: SimulatorConfig, json_report: bool) -> Result<()> {
    init_logging_from_config(&config.logging)?;

    let pool_config = ConnectionPoolConfig::from(&config);
    info!(
        users = config.workload.users,
        pool_size = pool_config.capacity,
        max_retries = pool_config.max_retries,
        backoff_factor = pool_config.backoff_factor,
        base_url = %config.target.base_url,
        "Configuration loaded"
    );

    let catalog = ImageCatalog::scan(&config.workload.images_dir)?;
    let endpoints = Endpoints::from_target(&config.target)?;
    let pool = ConnectionPool::shared(pool_config).context("Failed to create connection pool")?;
    let transport: Arc<dyn HttpTransport> = pool.clone();

    let executor = ActionExecutor::new(
        transport,
        Arc::new(StatCounters::new()),
        Arc::new(catalog),
        Arc::new(RegexLinkExtractor::new()?),
        endpoints,
        config.workload.upload_probability,
    );

    let shutdown = CancellationToken::new();
    watch_for_interrupt(shutdown.clone());

    let mut orchestrator =
        CycleOrchestrator::new(OrchestratorSettings::from(&config.workload), executor)
            .with_report_sink(report_sink(json_report));
    let summary = orchestrator.run(shutdown).await;

    pool.close();

    let report = orchestrator.report("Final statistics");
    if json_report {
        print_json(&report)?;
    } else {
        println!();
        println!("{}", report);
    }
    if summary.interrupted {
        info!(cycles = summary.cycles_completed, "Simulation stopped by user");
    } else {
        info!(cycles = summary.cycles_completed, "Simulation ended cleanly");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", SimulatorConfig::generate_sample());
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, cli.json_report).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
