//! Administration commands and the reports logged around a run.

use chrono::NaiveDate;
use swarm_db::{ActivityStore, ActorStore, PostgresPool, QuotaStore};
use swarm_types::{ActorId, Credentials, PersonaClass};
use tracing::{info, warn};

use crate::cli::Selection;
use crate::error::RunnerError;

/// Flip the `enabled` flag of the selected actors, returning how many changed.
pub async fn set_enabled(
    pool: &PostgresPool,
    selection: &Selection,
    enabled: bool,
) -> Result<u64, RunnerError> {
    let actors = ActorStore::new(pool.pool());
    let count = match &selection.batch {
        Some(batch) => actors.set_enabled_by_batch(batch, enabled).await?,
        None => actors.set_enabled_all(enabled).await?,
    };
    if count == 0 {
        warn!(batch = ?selection.batch, enabled, "no actors matched");
    }
    Ok(count)
}

/// Add an existing platform account to the population.
pub async fn import(
    pool: &PostgresPool,
    credentials: &Credentials,
    persona: PersonaClass,
    batch: Option<&str>,
) -> Result<ActorId, RunnerError> {
    let id = ActorStore::new(pool.pool())
        .insert(credentials, persona, batch)
        .await?;
    info!(actor_id = %id, username = credentials.username, %persona, batch, "actor imported");
    Ok(id)
}

/// Log actor counts per persona.
pub async fn log_population(pool: &PostgresPool) {
    match ActorStore::new(pool.pool()).population_stats().await {
        Ok(rows) => {
            for row in rows {
                info!(
                    persona = row.persona,
                    total = row.total,
                    enabled = row.enabled,
                    active_last_day = row.active_last_day,
                    "population"
                );
            }
        }
        Err(e) => warn!(error = %e, "population stats unavailable"),
    }
}

/// Log quota usage and per-activity totals for `day`.
pub async fn log_daily_report(pool: &PostgresPool, day: NaiveDate) {
    match QuotaStore::new(pool.pool()).usage_for_day(day).await {
        Ok(rows) => {
            for row in rows {
                info!(%day, category = row.category, count = row.count, limit = row.daily_limit, "quota usage");
            }
        }
        Err(e) => warn!(error = %e, "quota usage unavailable"),
    }

    match ActivityStore::new(pool.pool()).report_for_day(day).await {
        Ok(rows) => {
            for row in rows {
                info!(
                    %day,
                    activity = row.activity_type,
                    attempts = row.attempts,
                    successes = row.successes,
                    actors = row.actors,
                    "daily activity"
                );
            }
        }
        Err(e) => warn!(error = %e, "activity report unavailable"),
    }
}
