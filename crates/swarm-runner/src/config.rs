//! Runner configuration loaded from environment variables.
//!
//! Everything about the simulation itself lives in `swarm-config.yaml`;
//! the environment only says where that file is and how the process
//! should behave around it.

use std::path::PathBuf;
use std::time::Duration;

use swarm_core::SwarmConfig;
use swarm_db::PostgresConfig;

use crate::error::RunnerError;

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Path of the YAML configuration file.
    pub config_path: PathBuf,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Seed overriding `scheduler.seed` from the YAML file.
    pub seed: Option<u64>,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `SWARM_CONFIG` -- path to the YAML file (default `swarm-config.yaml`)
    /// - `LOG_FORMAT` -- `json` for JSON log lines (default `text`)
    /// - `HTTP_TIMEOUT_SECS` -- per-request timeout (default 30)
    /// - `RUN_SEED` -- fixed random seed for a reproducible run
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let config_path =
            PathBuf::from(lookup("SWARM_CONFIG").unwrap_or_else(|| "swarm-config.yaml".to_owned()));

        let json_logs = lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let http_timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_owned())
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid HTTP_TIMEOUT_SECS: {e}")))?;

        let seed = lookup("RUN_SEED")
            .map(|s| s.parse::<u64>())
            .transpose()
            .map_err(|e| RunnerError::Config(format!("invalid RUN_SEED: {e}")))?;

        Ok(Self {
            config_path,
            json_logs,
            http_timeout: Duration::from_secs(http_timeout_secs),
            seed,
        })
    }

    /// Load the YAML simulation configuration this runner points at.
    pub fn load_swarm_config(&self) -> Result<SwarmConfig, RunnerError> {
        Ok(SwarmConfig::from_file(&self.config_path)?)
    }
}

/// Pool configuration from the infrastructure section.
pub fn database_config(swarm: &SwarmConfig) -> PostgresConfig {
    let infrastructure = &swarm.infrastructure;
    PostgresConfig::new(infrastructure.database_url.clone())
        .with_max_connections(infrastructure.pool.max_connections)
        .with_acquire_timeout(infrastructure.pool.acquire_timeout())
        .with_idle_timeout(infrastructure.pool.idle_timeout())
}
