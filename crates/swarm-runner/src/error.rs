//! Error types for the runner binary.

use swarm_core::{ConfigError, GatewayError, StoreError};
use swarm_db::DbError;

/// Errors that abort a run before or after the population pass.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An environment variable is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The YAML configuration could not be loaded.
    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    /// Connecting to or migrating the database failed.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// The HTTP client could not be built.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Loading the population failed.
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}
