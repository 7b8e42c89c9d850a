//! Per-actor tracking state, stored as one JSONB document per actor.
//!
//! The orchestrator always writes the whole [`ActorState`] after a
//! mutation, so a single upsert keeps the id sets, the active lifecycle
//! pointers, and the quota tracking consistent with each other.

use sqlx::PgPool;
use swarm_types::{ActorId, ActorState};

use crate::error::DbError;

/// Operations on the `actor_states` table.
pub struct ActorStateStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ActorStateStore<'a> {
    /// Create a new state store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the stored state of an actor, if any was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::Serialization`] if the document does not decode.
    pub async fn get(&self, actor: ActorId) -> Result<Option<ActorState>, DbError> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT state FROM actor_states WHERE actor_id = $1")
                .bind(actor.into_inner())
                .fetch_optional(self.pool)
                .await?;

        doc.map(serde_json::from_value)
            .transpose()
            .map_err(DbError::Serialization)
    }

    /// Insert or replace the state of an actor.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails (including a
    /// foreign-key violation for an unknown actor).
    pub async fn put(&self, actor: ActorId, state: &ActorState) -> Result<(), DbError> {
        let doc = serde_json::to_value(state)?;
        sqlx::query(
            r"INSERT INTO actor_states (actor_id, state, updated_at)
              VALUES ($1, $2, NOW())
              ON CONFLICT (actor_id)
              DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at",
        )
        .bind(actor.into_inner())
        .bind(&doc)
        .execute(self.pool)
        .await?;

        tracing::trace!(actor_id = %actor, "Actor state saved");
        Ok(())
    }
}
