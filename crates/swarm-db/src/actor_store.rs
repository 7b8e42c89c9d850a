//! Actor records: loading the active population, caching sessions, and
//! administration helpers.
//!
//! Accounts are provisioned on the platform elsewhere; this store only
//! imports them ([`ActorStore::insert`]) and flips their `enabled` flag.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use swarm_types::{Actor, ActorId, Credentials, EntityId, PersonaClass, Session};

use crate::error::DbError;

/// Operations on the `actors` table.
pub struct ActorStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ActorStore<'a> {
    /// Create a new actor store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Import an already provisioned account, returning its local id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (for instance on a
    /// duplicate username).
    pub async fn insert(
        &self,
        credentials: &Credentials,
        persona: PersonaClass,
        batch_id: Option<&str>,
    ) -> Result<ActorId, DbError> {
        let id: i64 = sqlx::query_scalar(
            r"INSERT INTO actors (username, password, persona, batch_id)
              VALUES ($1, $2, $3, $4)
              RETURNING id",
        )
        .bind(&credentials.username)
        .bind(&credentials.password)
        .bind(persona.as_str())
        .bind(batch_id)
        .fetch_one(self.pool)
        .await?;

        Ok(ActorId(id))
    }

    /// All enabled actors, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidRow`] if a row holds an unknown persona.
    pub async fn active(&self) -> Result<Vec<Actor>, DbError> {
        let rows = sqlx::query_as::<_, ActorRow>(
            r"SELECT id, username, password, persona, remote_user_id, batch_id, enabled,
                     session_token, session_user_id, session_streak, session_expires_at
              FROM actors
              WHERE enabled
              ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ActorRow::into_actor).collect()
    }

    /// Fetch one actor regardless of its `enabled` flag.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: ActorId) -> Result<Option<Actor>, DbError> {
        let row = sqlx::query_as::<_, ActorRow>(
            r"SELECT id, username, password, persona, remote_user_id, batch_id, enabled,
                     session_token, session_user_id, session_streak, session_expires_at
              FROM actors
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(ActorRow::into_actor).transpose()
    }

    /// Cache a session and record the remote user id it belongs to.
    ///
    /// Returns `false` if no actor has this id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn save_session(&self, id: ActorId, session: &Session) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"UPDATE actors
              SET session_token = $2,
                  session_user_id = $3,
                  session_streak = $4,
                  session_expires_at = $5,
                  remote_user_id = $3,
                  last_active_at = NOW()
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(&session.token)
        .bind(session.user_id.into_inner())
        .bind(i32::try_from(session.current_streak).unwrap_or(i32::MAX))
        .bind(session.expires_at)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Enable or disable every actor of a provisioning batch.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn set_enabled_by_batch(&self, batch_id: &str, enabled: bool) -> Result<u64, DbError> {
        let result = sqlx::query("UPDATE actors SET enabled = $2 WHERE batch_id = $1")
            .bind(batch_id)
            .bind(enabled)
            .execute(self.pool)
            .await?;

        tracing::info!(batch_id, enabled, count = result.rows_affected(), "Batch toggled");
        Ok(result.rows_affected())
    }

    /// Enable or disable the whole population.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn set_enabled_all(&self, enabled: bool) -> Result<u64, DbError> {
        let result = sqlx::query("UPDATE actors SET enabled = $1")
            .bind(enabled)
            .execute(self.pool)
            .await?;

        tracing::info!(enabled, count = result.rows_affected(), "Population toggled");
        Ok(result.rows_affected())
    }

    /// Actor counts per persona.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn population_stats(&self) -> Result<Vec<PersonaStatsRow>, DbError> {
        let rows = sqlx::query_as::<_, PersonaStatsRow>(
            r"SELECT persona,
                     COUNT(*) AS total,
                     COUNT(*) FILTER (WHERE enabled) AS enabled,
                     COUNT(*) FILTER (WHERE last_active_at > NOW() - INTERVAL '1 day') AS active_last_day
              FROM actors
              GROUP BY persona
              ORDER BY persona",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// A row from the `actors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActorRow {
    /// Local actor id.
    pub id: i64,
    /// Remote username.
    pub username: String,
    /// Remote password.
    pub password: String,
    /// Persona class name.
    pub persona: String,
    /// Remote user id, once known.
    pub remote_user_id: Option<i64>,
    /// Provisioning batch.
    pub batch_id: Option<String>,
    /// Whether the scheduler picks this actor up.
    pub enabled: bool,
    /// Cached bearer token.
    pub session_token: Option<String>,
    /// Remote user id the cached token belongs to.
    pub session_user_id: Option<i64>,
    /// Streak reported at the last login.
    pub session_streak: Option<i32>,
    /// Cached token expiry.
    pub session_expires_at: Option<DateTime<Utc>>,
}

impl ActorRow {
    /// Convert into the domain type.
    ///
    /// A partially written session (any session column missing) is treated
    /// as no session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if the persona is unknown.
    pub fn into_actor(self) -> Result<Actor, DbError> {
        let persona = self
            .persona
            .parse::<PersonaClass>()
            .map_err(|e| DbError::InvalidRow(format!("actor {}: {e}", self.id)))?;

        let session = match (self.session_token, self.session_user_id, self.session_expires_at) {
            (Some(token), Some(user_id), Some(expires_at)) => Some(Session {
                token,
                user_id: EntityId(user_id),
                current_streak: self
                    .session_streak
                    .and_then(|s| u32::try_from(s).ok())
                    .unwrap_or(0),
                expires_at,
            }),
            _ => None,
        };

        Ok(Actor {
            id: ActorId(self.id),
            persona,
            remote_user_id: self.remote_user_id.map(EntityId),
            credentials: Credentials {
                username: self.username,
                password: self.password,
            },
            batch_id: self.batch_id,
            enabled: self.enabled,
            session,
        })
    }
}

/// Actor counts for one persona.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PersonaStatsRow {
    /// Persona class name.
    pub persona: String,
    /// All actors of this persona.
    pub total: i64,
    /// Enabled actors.
    pub enabled: i64,
    /// Actors that logged in during the last 24 hours.
    pub active_last_day: i64,
}
