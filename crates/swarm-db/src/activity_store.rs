//! Append-only activity audit log.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use swarm_types::ActivityLogEntry;

use crate::error::DbError;

/// Operations on the `activity_logs` table.
pub struct ActivityStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityStore<'a> {
    /// Create a new activity store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn append(&self, entry: &ActivityLogEntry) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO activity_logs (actor_id, activity_type, entity_type, entity_id, success, details, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.actor_id.into_inner())
        .bind(entry.kind.as_str())
        .bind(entry.entity_type.as_deref())
        .bind(entry.entity_id.map(swarm_types::EntityId::into_inner))
        .bind(entry.success)
        .bind(&entry.details)
        .bind(entry.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Attempts and successes per activity kind for one UTC day.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn report_for_day(&self, day: NaiveDate) -> Result<Vec<ActivityReportRow>, DbError> {
        let from = day.and_time(NaiveTime::MIN).and_utc();
        let to = day
            .succ_opt()
            .map_or(chrono::DateTime::<chrono::Utc>::MAX_UTC, |next| {
                next.and_time(NaiveTime::MIN).and_utc()
            });

        let rows = sqlx::query_as::<_, ActivityReportRow>(
            r"SELECT activity_type,
                     COUNT(*) AS attempts,
                     COUNT(*) FILTER (WHERE success) AS successes,
                     COUNT(DISTINCT actor_id) AS actors
              FROM activity_logs
              WHERE created_at >= $1 AND created_at < $2
              GROUP BY activity_type
              ORDER BY activity_type",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Aggregated activity for one kind.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityReportRow {
    /// Activity kind name.
    pub activity_type: String,
    /// All logged attempts.
    pub attempts: i64,
    /// Attempts the platform reflected.
    pub successes: i64,
    /// Distinct actors involved.
    pub actors: i64,
}
