//! Entry point that runs one pass of the Swarm population.
//!
//! Each invocation loads the configuration, connects to `PostgreSQL`,
//! walks every enabled actor once through the scheduler, logs the run
//! summary with today's quota usage and activity report, and exits.
//! Periodic execution is left to cron or a systemd timer. Subcommands
//! import accounts, enable or disable them, and print reports.
//!
//! # Architecture
//!
//! ```text
//! env + swarm-config.yaml + argv
//!     |
//!     +-- PostgresPool --> PgStateStore --+
//!     |                                   +--> Orchestrator --> Scheduler --> RunSummary
//!     +-- HttpGateway --------------------+
//! ```

mod admin;
mod cli;
mod config;
mod error;

use chrono::Utc;
use clap::Parser;
use swarm_core::{CannedCommentary, Orchestrator, Scheduler, SwarmConfig};
use swarm_db::{PgStateStore, PostgresPool};
use swarm_gateway::{GatewayConfig, HttpGateway};
use swarm_types::Credentials;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::{RunnerConfig, database_config};
use crate::error::RunnerError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the database connection, or loading
/// the population fails. Failures of individual actors never abort the run.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let command = Cli::parse().into_command();
    let config = RunnerConfig::from_env()?;
    init_tracing(config.json_logs);

    info!("swarm-runner starting");

    let swarm = config.load_swarm_config()?;
    info!(
        config_path = %config.config_path.display(),
        api_base_url = swarm.infrastructure.api_base_url,
        min_delay_secs = swarm.scheduler.min_delay_secs,
        max_delay_secs = swarm.scheduler.max_delay_secs,
        max_actors = ?swarm.scheduler.max_actors,
        "configuration loaded"
    );

    let pool = PostgresPool::connect(&database_config(&swarm)).await?;
    let result = dispatch(command, &config, &swarm, &pool).await;
    pool.close().await;
    result?;

    Ok(())
}

/// Initialize structured logging; `RUST_LOG` overrides the `info` default.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn dispatch(
    command: Command,
    config: &RunnerConfig,
    swarm: &SwarmConfig,
    pool: &PostgresPool,
) -> Result<(), RunnerError> {
    pool.run_migrations().await?;

    match command {
        Command::Run => run(config, swarm, pool).await?,
        Command::Enable(selection) => {
            let count = admin::set_enabled(pool, &selection, true).await?;
            info!(count, "actors enabled");
        }
        Command::Disable(selection) => {
            let count = admin::set_enabled(pool, &selection, false).await?;
            info!(count, "actors disabled");
        }
        Command::Import {
            username,
            password,
            persona,
            batch,
        } => {
            let credentials = Credentials { username, password };
            admin::import(pool, &credentials, persona, batch.as_deref()).await?;
        }
        Command::Stats => admin::log_population(pool).await,
        Command::Report { day } => {
            admin::log_daily_report(pool, day.unwrap_or_else(|| Utc::now().date_naive())).await;
        }
    }
    Ok(())
}

async fn run(
    config: &RunnerConfig,
    swarm: &SwarmConfig,
    pool: &PostgresPool,
) -> Result<(), RunnerError> {
    admin::log_population(pool).await;

    let store = PgStateStore::new(pool.clone());
    let gateway = HttpGateway::new(
        GatewayConfig::new(&swarm.infrastructure.api_base_url).with_timeout(config.http_timeout),
    )?;
    let personas = swarm.persona_book();
    let commentary = CannedCommentary;

    let orchestrator = Orchestrator::new(
        &store,
        &gateway,
        &personas,
        &commentary,
        swarm.orchestrator_settings(),
    );
    let seed = config.seed.or(swarm.scheduler.seed);
    let mut scheduler = Scheduler::new(orchestrator, swarm.scheduler_settings(), seed);

    let summary = scheduler.run_population().await?;

    let elapsed = summary.finished_at.signed_duration_since(summary.started_at);
    info!(
        total = summary.total,
        processed = summary.processed,
        skipped = summary.skipped,
        errored = summary.errored,
        activities = summary.total_activities(),
        elapsed_secs = elapsed.num_seconds(),
        "run summary"
    );
    for (kind, count) in &summary.activities {
        info!(activity = %kind, count, "activity total");
    }

    admin::log_daily_report(pool, Utc::now().date_naive()).await;
    Ok(())
}
