//! [`StateStore`] backed by `PostgreSQL`.

use chrono::NaiveDate;
use swarm_core::{StateStore, StoreError};
use swarm_types::{
    ActivityLogEntry, Actor, ActorId, ActorState, GenerationCategory, Reservation, Session,
};

use crate::activity_store::ActivityStore;
use crate::actor_store::ActorStore;
use crate::postgres::PostgresPool;
use crate::quota_store::QuotaStore;
use crate::state_store::ActorStateStore;

/// The durable state store used by the runner.
#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PostgresPool,
}

impl PgStateStore {
    /// Wrap a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for the administration stores.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

impl StateStore for PgStateStore {
    async fn active_actors(&self) -> Result<Vec<Actor>, StoreError> {
        Ok(ActorStore::new(self.pool.pool()).active().await?)
    }

    async fn actor_state(&self, actor: ActorId) -> Result<ActorState, StoreError> {
        let state = ActorStateStore::new(self.pool.pool()).get(actor).await?;
        Ok(state.unwrap_or_default())
    }

    async fn put_actor_state(&self, actor: ActorId, state: &ActorState) -> Result<(), StoreError> {
        Ok(ActorStateStore::new(self.pool.pool()).put(actor, state).await?)
    }

    async fn save_session(&self, actor: ActorId, session: &Session) -> Result<(), StoreError> {
        if ActorStore::new(self.pool.pool())
            .save_session(actor, session)
            .await?
        {
            Ok(())
        } else {
            Err(StoreError::ActorNotFound(actor))
        }
    }

    async fn quota_count(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> Result<u32, StoreError> {
        Ok(QuotaStore::new(self.pool.pool()).count(day, category).await?)
    }

    async fn reserve_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<Reservation, StoreError> {
        Ok(QuotaStore::new(self.pool.pool())
            .reserve(day, category, limit)
            .await?)
    }

    async fn rollback_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> Result<(), StoreError> {
        Ok(QuotaStore::new(self.pool.pool()).rollback(day, category).await?)
    }

    async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), StoreError> {
        Ok(ActivityStore::new(self.pool.pool()).append(entry).await?)
    }
}
