//! Population scheduler.
//!
//! [`Scheduler::run_once`] walks the whole actor population once:
//!
//! 1. shuffle the population and cap it at the configured size,
//! 2. for each actor roll the persona's activity frequency,
//! 3. run the actor's turn, catching errors *and* panics at the actor
//!    boundary so one bad actor never stops the run,
//! 4. sleep a random delay between actors (not after the last one),
//! 5. fold everything into a [`RunSummary`].
//!
//! The scheduler owns its random source. Production seeds it from the OS;
//! tests pass a fixed seed for reproducible runs.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use swarm_types::{Actor, RunSummary};
use tracing::{debug, error, info, warn};

use crate::gateway::Gateway;
use crate::orchestrator::Orchestrator;
use crate::persona::should_perform;
use crate::store::{StateStore, StoreError};

/// Pacing and population limits of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Shortest pause between two actors.
    pub min_delay: Duration,
    /// Longest pause between two actors.
    pub max_delay: Duration,
    /// Process at most this many actors per run.
    pub max_actors: Option<usize>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(20),
            max_delay: Duration::from_secs(60),
            max_actors: None,
        }
    }
}

/// Runs actor turns across the population.
pub struct Scheduler<'a, S, G> {
    orchestrator: Orchestrator<'a, S, G>,
    settings: SchedulerSettings,
    rng: StdRng,
}

impl<'a, S: StateStore, G: Gateway> Scheduler<'a, S, G> {
    /// Create a scheduler; `seed` fixes the random source, `None` seeds it
    /// from the operating system.
    pub fn new(
        orchestrator: Orchestrator<'a, S, G>,
        settings: SchedulerSettings,
        seed: Option<u64>,
    ) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            orchestrator,
            settings,
            rng,
        }
    }

    /// Load the enabled population from the store and run it once.
    pub async fn run_population(&mut self) -> Result<RunSummary, StoreError> {
        let actors = self.orchestrator.store().active_actors().await?;
        Ok(self.run_once(actors).await)
    }

    /// Run every actor in `actors` once.
    pub async fn run_once(&mut self, mut actors: Vec<Actor>) -> RunSummary {
        let mut summary = RunSummary::new(Utc::now());

        actors.shuffle(&mut self.rng);
        if let Some(max) = self.settings.max_actors {
            actors.truncate(max);
        }
        summary.total = actors.len();
        info!(total = summary.total, "Run starting");

        let last = actors.len().saturating_sub(1);
        for (index, actor) in actors.iter().enumerate() {
            self.process(actor, &mut summary).await;
            if index < last {
                let delay = self.next_delay();
                debug!(delay_ms = delay.as_millis(), "Waiting before next actor");
                tokio::time::sleep(delay).await;
            }
        }

        summary.finished_at = Utc::now();
        info!(
            total = summary.total,
            processed = summary.processed,
            skipped = summary.skipped,
            errored = summary.errored,
            activities = summary.total_activities(),
            duration_secs = summary
                .finished_at
                .signed_duration_since(summary.started_at)
                .num_seconds(),
            "Run finished"
        );
        summary
    }

    async fn process(&mut self, actor: &Actor, summary: &mut RunSummary) {
        if !actor.enabled {
            debug!(actor_id = %actor.id, "Actor disabled, skipping");
            summary.skipped = summary.skipped.saturating_add(1);
            return;
        }

        let profile = self.orchestrator.personas().profile(actor.persona);
        if !should_perform(&mut self.rng, profile.activity_frequency) {
            debug!(actor_id = %actor.id, persona = %actor.persona, "Inactive today");
            summary.skipped = summary.skipped.saturating_add(1);
            return;
        }

        let day = Utc::now().date_naive();
        let turn = AssertUnwindSafe(self.orchestrator.run_turn(actor, day, &mut self.rng))
            .catch_unwind()
            .await;

        match turn {
            Ok(Ok(report)) => {
                summary.processed = summary.processed.saturating_add(1);
                summary.record_all(&report.activities);
            }
            Ok(Err(err)) => {
                summary.errored = summary.errored.saturating_add(1);
                warn!(actor_id = %actor.id, error = %err, "Actor turn failed");
            }
            Err(panic) => {
                summary.errored = summary.errored.saturating_add(1);
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                error!(actor_id = %actor.id, panic = %message, "Actor turn panicked");
            }
        }
    }

    /// Uniform delay in `[min_delay, max_delay]` (bounds swapped if given
    /// in the wrong order).
    fn next_delay(&mut self) -> Duration {
        let lo = millis(self.settings.min_delay);
        let hi = millis(self.settings.max_delay);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Duration::from_millis(self.rng.random_range(lo..=hi))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use swarm_types::{
        ActivityKind, ActivityLogEntry, ActorId, ActorState, GenerationCategory, PersonaClass,
        Reservation, Session,
    };
    use tokio::time::Instant;

    use super::*;
    use crate::commentary::CannedCommentary;
    use crate::orchestrator::OrchestratorSettings;
    use crate::persona::{PersonaBook, PersonaProfile};
    use crate::quota::QuotaLimits;
    use crate::store::MemoryStateStore;
    use crate::testing::{ScriptedGateway, actor, book_of, quiet_profile};

    fn quick() -> OrchestratorSettings {
        OrchestratorSettings {
            activity_pause: Duration::ZERO,
            ..OrchestratorSettings::default()
        }
    }

    fn population(n: i64) -> Vec<Actor> {
        (1..=n).map(|id| actor(id, PersonaClass::Normal)).collect()
    }

    async fn run<S: StateStore>(
        store: &S,
        gateway: &ScriptedGateway,
        book: &PersonaBook,
        settings: SchedulerSettings,
        actors: Vec<Actor>,
    ) -> RunSummary {
        let orchestrator = Orchestrator::new(store, gateway, book, &CannedCommentary, quick());
        let mut scheduler = Scheduler::new(orchestrator, settings, Some(7));
        scheduler.run_once(actors).await
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_actor_is_isolated() {
        let actors = population(5);
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        gateway.panic_on_login("bot_3");
        let book = book_of(quiet_profile());

        let summary = run(&store, &gateway, &book, SchedulerSettings::default(), actors).await;

        assert_eq!(summary.total, 5);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.count(ActivityKind::Login), 4);
        assert_eq!(gateway.calls_starting_with("login").len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_generation_returns_its_quota() {
        let actors = population(1);
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        gateway.panic_on_generate();
        let book = book_of(PersonaProfile {
            ai_enabled: true,
            ..quiet_profile()
        });
        let settings = OrchestratorSettings {
            generation_probability: 1.0,
            limits: QuotaLimits {
                diet_generation: 1,
                exercise_generation: 0,
            },
            ..quick()
        };
        let orchestrator = Orchestrator::new(&store, &gateway, &book, &CannedCommentary, settings);
        let mut scheduler = Scheduler::new(orchestrator, SchedulerSettings::default(), Some(7));

        let summary = scheduler.run_once(actors).await;

        assert_eq!(summary.errored, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(gateway.calls_starting_with("generate").len(), 1);
        let today = Utc::now().date_naive();
        assert_eq!(
            store
                .quota_count(today, GenerationCategory::DietGeneration)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_failure_counts_as_error() {
        let actors = population(3);
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        gateway.reject_login("bot_2");
        let book = book_of(quiet_profile());

        let summary = run(&store, &gateway, &book, SchedulerSettings::default(), actors).await;

        assert_eq!(summary.errored, 1);
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_and_disabled_actors_are_skipped() {
        let mut actors = population(4);
        if let Some(first) = actors.first_mut() {
            first.enabled = false;
        }
        if let Some(second) = actors.get_mut(1) {
            second.persona = PersonaClass::Dormant;
        }
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        let mut overrides: std::collections::BTreeMap<_, _> = PersonaClass::ALL
            .into_iter()
            .map(|c| (c, quiet_profile()))
            .collect();
        overrides.insert(
            PersonaClass::Dormant,
            PersonaProfile {
                activity_frequency: 0.0,
                ..quiet_profile()
            },
        );
        let book = PersonaBook::with_overrides(overrides);

        let summary = run(&store, &gateway, &book, SchedulerSettings::default(), actors).await;

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.errored, 0);
        assert!(!gateway.calls().contains(&"login bot_1".to_owned()));
        assert!(!gateway.calls().contains(&"login bot_2".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn population_is_capped() {
        let actors = population(6);
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        let book = book_of(quiet_profile());
        let settings = SchedulerSettings {
            max_actors: Some(2),
            ..SchedulerSettings::default()
        };

        let summary = run(&store, &gateway, &book, settings, actors).await;

        assert_eq!(summary.total, 2);
        assert_eq!(gateway.calls_starting_with("login").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_only_between_actors() {
        let actors = population(3);
        let store = MemoryStateStore::with_actors(actors.clone());
        let gateway = ScriptedGateway::new();
        let book = book_of(quiet_profile());
        let settings = SchedulerSettings {
            min_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(10),
            max_actors: None,
        };

        let started = Instant::now();
        run(&store, &gateway, &book, settings, actors).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_secs(20), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(21), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn same_seed_same_order() {
        let book = book_of(quiet_profile());
        let mut orders = Vec::new();
        for _ in 0..2 {
            let actors = population(8);
            let store = MemoryStateStore::with_actors(actors.clone());
            let gateway = ScriptedGateway::new();
            run(&store, &gateway, &book, SchedulerSettings::default(), actors).await;
            orders.push(gateway.calls_starting_with("login"));
        }
        assert_eq!(orders.first(), orders.get(1));
    }

    #[tokio::test(start_paused = true)]
    async fn run_population_loads_enabled_actors() {
        let mut actors = population(3);
        if let Some(last) = actors.last_mut() {
            last.enabled = false;
        }
        let store = MemoryStateStore::with_actors(actors);
        let gateway = ScriptedGateway::new();
        let book = book_of(quiet_profile());
        let orchestrator = Orchestrator::new(&store, &gateway, &book, &CannedCommentary, quick());
        let mut scheduler = Scheduler::new(orchestrator, SchedulerSettings::default(), Some(1));

        let summary = scheduler.run_population().await.unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.processed, 2);
    }

    /// Delegates to a memory store but cannot load state for one actor.
    struct BrokenStore {
        inner: MemoryStateStore,
        broken: ActorId,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct Fire;

    impl StateStore for BrokenStore {
        async fn active_actors(&self) -> Result<Vec<Actor>, StoreError> {
            self.inner.active_actors().await
        }

        async fn actor_state(&self, actor: ActorId) -> Result<ActorState, StoreError> {
            if actor == self.broken {
                return Err(StoreError::backend(Fire));
            }
            self.inner.actor_state(actor).await
        }

        async fn put_actor_state(&self, actor: ActorId, state: &ActorState) -> Result<(), StoreError> {
            self.inner.put_actor_state(actor, state).await
        }

        async fn save_session(&self, actor: ActorId, session: &Session) -> Result<(), StoreError> {
            self.inner.save_session(actor, session).await
        }

        async fn quota_count(
            &self,
            day: NaiveDate,
            category: GenerationCategory,
        ) -> Result<u32, StoreError> {
            self.inner.quota_count(day, category).await
        }

        async fn reserve_quota(
            &self,
            day: NaiveDate,
            category: GenerationCategory,
            limit: u32,
        ) -> Result<Reservation, StoreError> {
            self.inner.reserve_quota(day, category, limit).await
        }

        async fn rollback_quota(
            &self,
            day: NaiveDate,
            category: GenerationCategory,
        ) -> Result<(), StoreError> {
            self.inner.rollback_quota(day, category).await
        }

        async fn append_activity(&self, entry: &ActivityLogEntry) -> Result<(), StoreError> {
            self.inner.append_activity(entry).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn store_failure_is_isolated() {
        let actors = population(4);
        let store = BrokenStore {
            inner: MemoryStateStore::with_actors(actors.clone()),
            broken: ActorId(2),
        };
        let gateway = ScriptedGateway::new();
        let book = book_of(quiet_profile());

        let summary = run(&store, &gateway, &book, SchedulerSettings::default(), actors).await;

        assert_eq!(summary.errored, 1);
        assert_eq!(summary.processed, summary.total - summary.skipped - 1);
    }
}
