//! State store trait and the in-process implementation.
//!
//! The [`StateStore`] trait abstracts everything the orchestrator and the
//! quota service persist: per-actor tracking state, cached sessions, the
//! per-day quota counters, and the activity log. The `PostgreSQL`
//! implementation lives in `swarm-db`; [`MemoryStateStore`] keeps all of it
//! behind a single [`tokio::sync::Mutex`] and is used by tests and by
//! embedders that do not need durability.
//!
//! Quota reservation must be atomic: `reserve_quota` checks `count < limit`
//! and increments in one indivisible step, so concurrent callers can never
//! take the same last unit.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::NaiveDate;
use swarm_types::{
    ActivityLogEntry, Actor, ActorId, ActorState, GenerationCategory, Reservation, Session,
};
use tokio::sync::Mutex;

/// Errors surfaced by a [`StateStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed (connection, query, serialization).
    #[error("state store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A referenced actor does not exist.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Persistence required by the orchestrator, quota service, and scheduler.
pub trait StateStore: Send + Sync {
    /// All enabled actors.
    fn active_actors(&self) -> impl Future<Output = Result<Vec<Actor>, StoreError>> + Send;

    /// Tracking state of an actor; an actor never seen before gets the
    /// default (empty) state.
    fn actor_state(
        &self,
        actor: ActorId,
    ) -> impl Future<Output = Result<ActorState, StoreError>> + Send;

    /// Replace the tracking state of an actor.
    fn put_actor_state(
        &self,
        actor: ActorId,
        state: &ActorState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Cache a session for the next run.
    fn save_session(
        &self,
        actor: ActorId,
        session: &Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Current quota count for `(day, category)`; zero if never reserved.
    fn quota_count(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Atomically take one unit if `count < limit`.
    fn reserve_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> impl Future<Output = Result<Reservation, StoreError>> + Send;

    /// Give back one previously reserved unit, never going below zero.
    fn rollback_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append an audit record.
    fn append_activity(
        &self,
        entry: &ActivityLogEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Default)]
struct MemoryInner {
    actors: BTreeMap<ActorId, Actor>,
    states: BTreeMap<ActorId, ActorState>,
    quotas: BTreeMap<(NaiveDate, GenerationCategory), u32>,
    activity: Vec<ActivityLogEntry>,
}

/// In-process [`StateStore`].
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStateStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `actors`.
    pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        let inner = MemoryInner {
            actors: actors.into_iter().map(|a| (a.id, a)).collect(),
            ..MemoryInner::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Add or replace an actor.
    pub async fn insert_actor(&self, actor: Actor) {
        self.inner.lock().await.actors.insert(actor.id, actor);
    }

    /// Look up an actor, including disabled ones.
    pub async fn actor(&self, id: ActorId) -> Option<Actor> {
        self.inner.lock().await.actors.get(&id).cloned()
    }

    /// Snapshot of the activity log.
    pub async fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.inner.lock().await.activity.clone()
    }
}

impl StateStore for MemoryStateStore {
    async fn active_actors(&self) -> Result<Vec<Actor>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.actors.values().filter(|a| a.enabled).cloned().collect())
    }

    async fn actor_state(&self, actor: ActorId) -> Result<ActorState, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.states.get(&actor).cloned().unwrap_or_default())
    }

    async fn put_actor_state(&self, actor: ActorId, state: &ActorState) -> Result<(), StoreError> {
        self.inner.lock().await.states.insert(actor, state.clone());
        Ok(())
    }

    async fn save_session(&self, actor: ActorId, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .actors
            .get_mut(&actor)
            .ok_or(StoreError::ActorNotFound(actor))?;
        entry.remote_user_id = Some(session.user_id);
        entry.session = Some(session.clone());
        Ok(())
    }

    async fn quota_count(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> Result<u32, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.quotas.get(&(day, category)).copied().unwrap_or(0))
    }

    async fn reserve_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<Reservation, StoreError> {
        let mut inner = self.inner.lock().await;
        let count = inner.quotas.entry((day, category)).or_insert(0);
        if *count < limit {
            *count = count.saturating_add(1);
            Ok(Reservation::Reserved)
        } else {
            Ok(Reservation::Refused)
        }
    }

    async fn rollback_quota(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(count) = inner.quotas.get_mut(&(day, category)) {
            *count = count.saturating_sub(1);
        }
        Ok(())
    }

    async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), StoreError> {
        self.inner.lock().await.activity.push(entry.clone());
        Ok(())
    }
}
