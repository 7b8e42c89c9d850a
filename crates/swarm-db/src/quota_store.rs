//! Global per-day quota counters.
//!
//! One row per `(day, category)`, created lazily on the first reservation
//! attempt of the day. A reservation is a single conditional `UPDATE`
//! (`count < limit`) inside a transaction; `PostgreSQL` re-checks the
//! predicate against the latest row version after acquiring the row lock,
//! so concurrent reservers across processes can never push the count past
//! the limit.

use chrono::NaiveDate;
use sqlx::PgPool;
use swarm_types::{GenerationCategory, Reservation};

use crate::error::DbError;

/// Operations on the `global_quotas` table.
pub struct QuotaStore<'a> {
    pool: &'a PgPool,
}

impl<'a> QuotaStore<'a> {
    /// Create a new quota store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current count; zero when no row exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count(&self, day: NaiveDate, category: GenerationCategory) -> Result<u32, DbError> {
        let count: Option<i32> =
            sqlx::query_scalar("SELECT count FROM global_quotas WHERE day = $1 AND category = $2")
                .bind(day)
                .bind(category.as_str())
                .fetch_optional(self.pool)
                .await?;

        Ok(count.and_then(|c| u32::try_from(c).ok()).unwrap_or(0))
    }

    /// Take one unit if the count is below `limit`.
    ///
    /// The stored `daily_limit` is refreshed to `limit` on every successful
    /// reservation so reports reflect the limit currently in force.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the transaction fails.
    pub async fn reserve(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<Reservation, DbError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"INSERT INTO global_quotas (day, category, count, daily_limit)
              VALUES ($1, $2, 0, $3)
              ON CONFLICT (day, category) DO NOTHING",
        )
        .bind(day)
        .bind(category.as_str())
        .bind(limit)
        .execute(&mut *tx)
        .await?;

        let taken: Option<i32> = sqlx::query_scalar(
            r"UPDATE global_quotas
              SET count = count + 1, daily_limit = $3, updated_at = NOW()
              WHERE day = $1 AND category = $2 AND count < $3
              RETURNING count",
        )
        .bind(day)
        .bind(category.as_str())
        .bind(limit)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(match taken {
            Some(count) => {
                tracing::debug!(%day, %category, count, limit, "Quota reserved");
                Reservation::Reserved
            }
            None => {
                tracing::debug!(%day, %category, limit, "Quota exhausted");
                Reservation::Refused
            }
        })
    }

    /// Give one unit back, never going below zero.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn rollback(&self, day: NaiveDate, category: GenerationCategory) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE global_quotas
              SET count = GREATEST(count - 1, 0), updated_at = NOW()
              WHERE day = $1 AND category = $2",
        )
        .bind(day)
        .bind(category.as_str())
        .execute(self.pool)
        .await?;

        tracing::debug!(%day, %category, "Quota rolled back");
        Ok(())
    }

    /// Every counter of one day.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn usage_for_day(&self, day: NaiveDate) -> Result<Vec<QuotaRow>, DbError> {
        let rows = sqlx::query_as::<_, QuotaRow>(
            r"SELECT day, category, count, daily_limit
              FROM global_quotas
              WHERE day = $1
              ORDER BY category",
        )
        .bind(day)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// A row from the `global_quotas` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuotaRow {
    /// Calendar day.
    pub day: NaiveDate,
    /// Category name (`diet-generation`, `exercise-generation`).
    pub category: String,
    /// Units consumed.
    pub count: i32,
    /// Limit in force at the last reservation.
    pub daily_limit: i32,
}
