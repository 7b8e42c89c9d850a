//! Per-actor activity orchestration.
//!
//! One call to [`Orchestrator::run_turn`] plays a single actor's day:
//!
//! ```text
//!   login ─> blog ─> diet ─> exercise ─> social ─> tracking ─> generation
//! ```
//!
//! Each step samples the actor's persona, calls the [`Gateway`], and
//! reconciles [`ActorState`] only after the platform confirms the action
//! (applied now or already applied earlier). State is persisted right after
//! every mutation, so a failure later in the turn never loses earlier work.
//!
//! Gateway failures are per-activity: they are logged and the turn moves
//! on. Store failures abort the turn. A failed login ends the turn with
//! [`OrchestratorError::Authentication`].

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::json;
use swarm_types::{
    ActivityKind, ActivityLogEntry, Actor, ActorId, ActorState, CalculatorKind, Catalog,
    EntityId, GenerationCategory, Lifecycle, LifecycleCategory, Listing, Outcome, Session,
    SocialAction, TelemetryAck, TelemetryEvent,
};
use tracing::{debug, error, info, warn};

use crate::commentary::Commentary;
use crate::forms;
use crate::gateway::{Gateway, GatewayError};
use crate::persona::{
    EXPERT_FOLLOW_PROBABILITY, GENERATION_PROBABILITY, PersonaBook, PersonaProfile,
    REVIEW_PROBABILITY, REVIEW_RATING, select_category, should_perform,
};
use crate::quota::{QuotaLimits, QuotaService};
use crate::store::{StateStore, StoreError};

/// Catalog page sizes.
const BLOG_PAGE: u32 = 30;
const BLOG_PAGE_FOR_COMMENTS: u32 = 10;
const COMMENT_PAGE: u32 = 50;
const PLAN_PAGE: u32 = 20;
const LEADERBOARD_PAGE: u32 = 50;
const CIRCLE_PAGE: u32 = 15;
const EXPERT_PAGE: u32 = 20;

/// Water logged per glass, in millilitres.
const GLASS_ML: u32 = 200;

/// Errors that end an actor's turn.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The actor could not log in.
    #[error("authentication failed for actor {actor_id}: {source}")]
    Authentication {
        /// The actor whose login failed.
        actor_id: ActorId,
        /// The gateway's answer.
        #[source]
        source: GatewayError,
    },

    /// The state store failed.
    #[error("state store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Tunables of a turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    /// Daily system-wide generation limits.
    pub limits: QuotaLimits,
    /// Pause between activity groups.
    pub activity_pause: Duration,
    /// Probability of reviewing a completed plan (AI-enabled personas).
    pub review_probability: f64,
    /// Probability of attempting content generation (AI-enabled personas).
    pub generation_probability: f64,
    /// Probability of following an expert after visiting their profile.
    pub expert_follow_probability: f64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            limits: QuotaLimits::default(),
            activity_pause: Duration::from_millis(800),
            review_probability: REVIEW_PROBABILITY,
            generation_probability: GENERATION_PROBABILITY,
            expert_follow_probability: EXPERT_FOLLOW_PROBABILITY,
        }
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Effective activities, in the order they happened.
    pub activities: Vec<ActivityKind>,
}

/// Mutable context threaded through the steps of one turn.
struct Turn<'t> {
    actor: &'t Actor,
    profile: PersonaProfile,
    session: Session,
    state: ActorState,
    day: NaiveDate,
    activities: Vec<ActivityKind>,
}

/// Whether a gateway answer counts as done, plus log details.
fn assess<T>(result: &Result<Outcome<T>, GatewayError>) -> (bool, serde_json::Value) {
    match result {
        Ok(Outcome::Applied(_)) => (true, json!({ "outcome": "applied" })),
        Ok(Outcome::AlreadyApplied(message)) => (
            true,
            json!({ "outcome": "already_applied", "message": message }),
        ),
        Ok(Outcome::Failed(message)) => (false, json!({ "outcome": "failed", "message": message })),
        Err(err) => (false, json!({ "outcome": "error", "message": err.to_string() })),
    }
}

fn with_field(mut details: serde_json::Value, key: &str, value: serde_json::Value) -> serde_json::Value {
    if let Some(map) = details.as_object_mut() {
        map.insert(key.to_owned(), value);
    }
    details
}

/// Drives one actor through its daily activities.
pub struct Orchestrator<'a, S, G> {
    store: &'a S,
    gateway: &'a G,
    personas: &'a PersonaBook,
    commentary: &'a dyn Commentary,
    settings: OrchestratorSettings,
}

impl<'a, S: StateStore, G: Gateway> Orchestrator<'a, S, G> {
    /// Create an orchestrator.
    pub const fn new(
        store: &'a S,
        gateway: &'a G,
        personas: &'a PersonaBook,
        commentary: &'a dyn Commentary,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            personas,
            commentary,
            settings,
        }
    }

    /// The persona table in use.
    pub const fn personas(&self) -> &PersonaBook {
        self.personas
    }

    /// The backing state store.
    pub const fn store(&self) -> &'a S {
        self.store
    }

    /// Play one turn for `actor` on `day`.
    pub async fn run_turn<R: Rng + Send>(
        &self,
        actor: &Actor,
        day: NaiveDate,
        rng: &mut R,
    ) -> Result<TurnReport, OrchestratorError> {
        let session = self.login(actor).await?;
        let state = self.store.actor_state(actor.id).await?;
        let mut turn = Turn {
            actor,
            profile: self.personas.profile(actor.persona),
            session,
            state,
            day,
            activities: vec![ActivityKind::Login],
        };

        self.blog(&mut turn, rng).await?;
        self.pause().await;

        for category in LifecycleCategory::ALL {
            self.review(&mut turn, category, rng).await?;
            self.advance_lifecycle(&mut turn, category, rng).await?;
            self.pause().await;
        }

        self.social(&mut turn, rng).await?;
        self.pause().await;

        self.tracking(&mut turn, rng).await?;
        self.pause().await;

        self.generate(&mut turn, rng).await?;

        debug!(
            actor_id = %actor.id,
            activities = turn.activities.len(),
            "Turn finished"
        );
        Ok(TurnReport {
            activities: turn.activities,
        })
    }

    async fn pause(&self) {
        if !self.settings.activity_pause.is_zero() {
            tokio::time::sleep(self.settings.activity_pause).await;
        }
    }

    // -----------------------------------------------------------------
    // Login
    // -----------------------------------------------------------------

    /// Reuse the cached session if the platform still accepts it,
    /// otherwise log in with credentials.
    async fn login(&self, actor: &Actor) -> Result<Session, OrchestratorError> {
        if let Some(cached) = actor.session.as_ref().filter(|s| s.is_valid_at(Utc::now())) {
            match self
                .gateway
                .dispatch_telemetry(cached, TelemetryEvent::LoginSuccess)
                .await
            {
                Ok(outcome) if outcome.is_effective() => {
                    let mut session = cached.clone();
                    if let Outcome::Applied(Some(TelemetryAck {
                        current_streak: Some(streak),
                    })) = outcome
                    {
                        session.current_streak = streak;
                        self.store.save_session(actor.id, &session).await?;
                    }
                    self.store
                        .append_activity(
                            &ActivityLogEntry::new(actor.id, ActivityKind::Login, true).with_details(
                                json!({ "session": "cached", "streak": session.current_streak }),
                            ),
                        )
                        .await?;
                    debug!(actor_id = %actor.id, streak = session.current_streak, "Cached session accepted");
                    return Ok(session);
                }
                Ok(outcome) => {
                    debug!(actor_id = %actor.id, message = ?outcome.message(), "Cached session rejected");
                }
                Err(err) => {
                    debug!(actor_id = %actor.id, error = %err, "Cached session check failed");
                }
            }
        }

        match self.gateway.login(&actor.credentials).await {
            Ok(session) => {
                self.store.save_session(actor.id, &session).await?;
                self.store
                    .append_activity(
                        &ActivityLogEntry::new(actor.id, ActivityKind::Login, true)
                            .with_details(json!({ "session": "fresh", "streak": session.current_streak })),
                    )
                    .await?;
                info!(
                    actor_id = %actor.id,
                    username = %actor.credentials.username,
                    streak = session.current_streak,
                    "Logged in"
                );
                Ok(session)
            }
            Err(source) => {
                self.store
                    .append_activity(
                        &ActivityLogEntry::new(actor.id, ActivityKind::Login, false)
                            .with_details(json!({ "message": source.to_string() })),
                    )
                    .await?;
                warn!(actor_id = %actor.id, error = %source, "Login failed");
                Err(OrchestratorError::Authentication {
                    actor_id: actor.id,
                    source,
                })
            }
        }
    }

    // -----------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------

    async fn persist(&self, turn: &Turn<'_>) -> Result<(), StoreError> {
        self.store.put_actor_state(turn.actor.id, &turn.state).await
    }

    /// Browse a catalog; transport failures are logged and yield `None`.
    async fn browse(&self, turn: &Turn<'_>, catalog: Catalog, limit: u32) -> Option<Vec<Listing>> {
        match self.gateway.browse(&turn.session, catalog, limit).await {
            Ok(items) => Some(items),
            Err(err) => {
                warn!(actor_id = %turn.actor.id, ?catalog, error = %err, "Catalog unavailable");
                None
            }
        }
    }

    /// Append the audit record for one attempt and count it if effective.
    async fn log_attempt(
        &self,
        turn: &mut Turn<'_>,
        kind: ActivityKind,
        target: Option<(&str, EntityId)>,
        effective: bool,
        details: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut entry = ActivityLogEntry::new(turn.actor.id, kind, effective).with_details(details);
        if let Some((entity_type, id)) = target {
            entry = entry.with_target(entity_type, id);
        }
        self.store.append_activity(&entry).await?;

        if effective {
            turn.activities.push(kind);
            debug!(actor_id = %turn.actor.id, activity = %kind, "Activity done");
        } else {
            debug!(actor_id = %turn.actor.id, activity = %kind, details = %entry.details, "Activity not done");
        }
        Ok(())
    }

    /// Log a gateway answer; returns whether it counts as done.
    async fn record<T: Sync>(
        &self,
        turn: &mut Turn<'_>,
        kind: ActivityKind,
        target: Option<(&str, EntityId)>,
        result: &Result<Outcome<T>, GatewayError>,
    ) -> Result<bool, StoreError> {
        let (effective, details) = assess(result);
        self.log_attempt(turn, kind, target, effective, details).await?;
        Ok(effective)
    }

    /// Perform a once-only action and log it.
    async fn attempt_once(
        &self,
        turn: &mut Turn<'_>,
        action: &SocialAction,
        target: (&str, EntityId),
        kind: ActivityKind,
    ) -> Result<bool, StoreError> {
        let result = self
            .gateway
            .perform_once(&turn.session, action, target.1)
            .await;
        self.record(turn, kind, Some(target), &result).await
    }

    // -----------------------------------------------------------------
    // Blog
    // -----------------------------------------------------------------

    async fn blog<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let behaviors = turn.profile.behaviors;
        if should_perform(rng, behaviors.blog_reading) {
            self.read_blog(turn, rng).await?;
        }
        if should_perform(rng, behaviors.like_comments) {
            self.like_comment(turn, rng).await?;
        }
        if turn.profile.ai_enabled && should_perform(rng, behaviors.blog_commenting) {
            self.comment_blog(turn, rng).await?;
        }
        Ok(())
    }

    async fn read_blog<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let Some(posts) = self.browse(turn, Catalog::Blogs, BLOG_PAGE).await else {
            return Ok(());
        };
        let unread: Vec<EntityId> = posts
            .iter()
            .map(|p| p.id)
            .filter(|id| !turn.state.read_blogs.contains(id))
            .collect();
        let Some(&post) = unread.choose(rng) else {
            debug!(actor_id = %turn.actor.id, "No unread blog posts");
            return Ok(());
        };

        if self
            .attempt_once(turn, &SocialAction::ReadBlog, ("blog", post), ActivityKind::BlogRead)
            .await?
        {
            turn.state.read_blogs.insert(post);
            self.persist(turn).await?;
        }
        Ok(())
    }

    async fn like_comment<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        let Some(posts) = self.browse(turn, Catalog::Blogs, BLOG_PAGE_FOR_COMMENTS).await else {
            return Ok(());
        };
        let Some(post) = posts.choose(rng).map(|p| p.id) else {
            return Ok(());
        };
        let Some(comments) = self
            .browse(turn, Catalog::Comments { post }, COMMENT_PAGE)
            .await
        else {
            return Ok(());
        };
        let own_id = turn.session.user_id;
        let unliked: Vec<EntityId> = comments
            .iter()
            .filter(|c| c.author_id != Some(own_id))
            .map(|c| c.id)
            .filter(|id| !turn.state.liked_comments.contains(id))
            .collect();
        let Some(&comment) = unliked.choose(rng) else {
            return Ok(());
        };

        if self
            .attempt_once(
                turn,
                &SocialAction::LikeComment,
                ("comment", comment),
                ActivityKind::CommentLike,
            )
            .await?
        {
            turn.state.liked_comments.insert(comment);
            self.persist(turn).await?;
        }
        Ok(())
    }

    /// Comment on a post read earlier and not commented on yet.
    async fn comment_blog<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        let candidates = turn.state.uncommented_blogs();
        let Some(&post) = candidates.choose(rng) else {
            debug!(actor_id = %turn.actor.id, "No read post left to comment on");
            return Ok(());
        };

        let title = self
            .browse(turn, Catalog::Blogs, BLOG_PAGE)
            .await
            .and_then(|posts| posts.into_iter().find(|p| p.id == post))
            .map(|p| p.title)
            .unwrap_or_default();
        let action = SocialAction::CommentBlog {
            body: self.commentary.blog_comment(&title, rng),
        };

        if self
            .attempt_once(turn, &action, ("blog", post), ActivityKind::BlogComment)
            .await?
        {
            turn.state.commented_blogs.insert(post);
            self.persist(turn).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Diet / exercise
    // -----------------------------------------------------------------

    /// Review one completed, unreviewed plan.
    async fn review<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        category: LifecycleCategory,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        if !turn.profile.ai_enabled {
            return Ok(());
        }
        let candidates = turn.state.track(category).review_candidates();
        if candidates.is_empty() || !should_perform(rng, self.settings.review_probability) {
            return Ok(());
        }
        let Some(&item) = candidates.choose(rng) else {
            return Ok(());
        };

        let title = self
            .browse(turn, category.catalog(), PLAN_PAGE)
            .await
            .and_then(|items| items.into_iter().find(|l| l.id == item))
            .map(|l| l.title)
            .unwrap_or_default();
        let rating = rng.random_range(REVIEW_RATING);
        let body = self.commentary.review(category, &title, rating, rng);
        let action = SocialAction::Review {
            category,
            rating,
            body,
        };

        if self
            .attempt_once(turn, &action, (category.as_str(), item), category.review_kind())
            .await?
        {
            turn.state.track_mut(category).mark_reviewed(item);
            self.persist(turn).await?;
        }
        Ok(())
    }

    /// Start a new plan or complete the active one.
    async fn advance_lifecycle<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        category: LifecycleCategory,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        let behaviors = turn.profile.behaviors;
        let (start_probability, complete_probability) = match category {
            LifecycleCategory::Diet => (behaviors.diet_start, behaviors.diet_complete),
            LifecycleCategory::Exercise => (behaviors.exercise_start, behaviors.exercise_complete),
        };

        let active = turn.state.track(category).active;
        match active {
            Lifecycle::Active(item) => {
                if !should_perform(rng, complete_probability) {
                    return Ok(());
                }
                let result = self
                    .gateway
                    .complete_lifecycle(&turn.session, category, item)
                    .await;
                let target = Some((category.as_str(), item));
                if self
                    .record(turn, category.complete_kind(), target, &result)
                    .await?
                {
                    turn.state.track_mut(category).complete_active();
                    self.persist(turn).await?;
                }
            }
            Lifecycle::Inactive => {
                if !should_perform(rng, start_probability) {
                    return Ok(());
                }
                let Some(items) = self.browse(turn, category.catalog(), PLAN_PAGE).await else {
                    return Ok(());
                };
                let track = turn.state.track(category);
                let eligible: Vec<EntityId> = items
                    .iter()
                    .map(|l| l.id)
                    .filter(|id| track.is_eligible(*id))
                    .collect();
                let Some(&item) = eligible.choose(rng) else {
                    debug!(actor_id = %turn.actor.id, %category, "No eligible plan to start");
                    return Ok(());
                };

                let result = self
                    .gateway
                    .start_lifecycle(&turn.session, category, item)
                    .await;
                let target = Some((category.as_str(), item));
                if self.record(turn, category.start_kind(), target, &result).await?
                    && turn.state.track_mut(category).activate(item)
                {
                    self.persist(turn).await?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Social
    // -----------------------------------------------------------------

    async fn social<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let behaviors = turn.profile.behaviors;
        if should_perform(rng, behaviors.follow_users) {
            self.follow(turn, rng).await?;
        }
        if !turn.state.followed_users.is_empty() && should_perform(rng, behaviors.send_high_five) {
            self.high_five(turn, rng).await?;
        }
        if turn.state.circle.is_none() && should_perform(rng, behaviors.circle_join) {
            self.join_circle(turn, rng).await?;
        }
        if should_perform(rng, behaviors.expert_visit) {
            self.visit_expert(turn, rng).await?;
        }
        Ok(())
    }

    async fn follow<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let Some(users) = self.browse(turn, Catalog::Leaderboard, LEADERBOARD_PAGE).await else {
            return Ok(());
        };
        let own_id = turn.session.user_id;
        let candidates: Vec<EntityId> = users
            .iter()
            .map(|u| u.id)
            .filter(|id| *id != own_id && !turn.state.followed_users.contains(id))
            .collect();
        let Some(&user) = candidates.choose(rng) else {
            return Ok(());
        };

        if self
            .attempt_once(turn, &SocialAction::FollowUser, ("user", user), ActivityKind::UserFollow)
            .await?
        {
            turn.state.followed_users.insert(user);
            self.persist(turn).await?;
        }
        Ok(())
    }

    async fn high_five<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let followed: Vec<EntityId> = turn.state.followed_users.iter().copied().collect();
        let Some(&user) = followed.choose(rng) else {
            return Ok(());
        };
        self.attempt_once(turn, &SocialAction::HighFive, ("user", user), ActivityKind::HighFive)
            .await?;
        Ok(())
    }

    async fn join_circle<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        let Some(circles) = self.browse(turn, Catalog::Circles, CIRCLE_PAGE).await else {
            return Ok(());
        };
        let Some(circle) = circles.choose(rng).map(|c| c.id) else {
            return Ok(());
        };

        let result = self
            .gateway
            .perform_once(&turn.session, &SocialAction::JoinCircle, circle)
            .await;
        self.record(turn, ActivityKind::CircleJoin, Some(("circle", circle)), &result)
            .await?;

        let joined = match result {
            Ok(Outcome::Applied(_)) => Some(circle),
            // Already in some circle; ask which one.
            Ok(Outcome::AlreadyApplied(_)) => self
                .browse(turn, Catalog::MyCircle, 1)
                .await
                .and_then(|mine| mine.first().map(|c| c.id)),
            Ok(Outcome::Failed(_)) | Err(_) => None,
        };
        if joined.is_some() {
            turn.state.circle = joined;
            self.persist(turn).await?;
        }
        Ok(())
    }

    /// Visit an expert's profile and sometimes follow them.
    ///
    /// Visits repeat freely; the follow is once-only and shares the
    /// followed-users set with leaderboard follows.
    async fn visit_expert<R: Rng + Send>(
        &self,
        turn: &mut Turn<'_>,
        rng: &mut R,
    ) -> Result<(), StoreError> {
        let Some(experts) = self.browse(turn, Catalog::Experts, EXPERT_PAGE).await else {
            return Ok(());
        };
        let Some(expert) = experts.choose(rng).cloned() else {
            return Ok(());
        };
        let Some(slug) = expert.slug else {
            debug!(actor_id = %turn.actor.id, expert_id = %expert.id, "Expert has no profile slug");
            return Ok(());
        };

        let action = SocialAction::VisitExpert {
            slug,
            view_session: format!("bot_{}_{}", turn.actor.id, Utc::now().timestamp_millis()),
        };
        if !self
            .attempt_once(turn, &action, ("expert", expert.id), ActivityKind::ExpertVisit)
            .await?
        {
            return Ok(());
        }

        let own_id = turn.session.user_id;
        let Some(user) = expert
            .author_id
            .filter(|id| *id != own_id && !turn.state.followed_users.contains(id))
        else {
            return Ok(());
        };
        if !should_perform(rng, self.settings.expert_follow_probability) {
            return Ok(());
        }
        if self
            .attempt_once(turn, &SocialAction::FollowUser, ("expert", user), ActivityKind::ExpertFollow)
            .await?
        {
            turn.state.followed_users.insert(user);
            self.persist(turn).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Tracking
    // -----------------------------------------------------------------

    async fn tracking<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        let behaviors = turn.profile.behaviors;

        if should_perform(rng, behaviors.water_tracking) {
            let glasses = rng.random_range(5..=12);
            let event = TelemetryEvent::WaterAdded {
                amount_ml: GLASS_ML,
            };
            self.dispatch_repeated(turn, event, glasses, ActivityKind::WaterLog)
                .await?;
        }

        if should_perform(rng, behaviors.meal_logging) {
            let meals = rng.random_range(1..=3);
            self.dispatch_repeated(
                turn,
                TelemetryEvent::MealPhotoUploaded,
                meals,
                ActivityKind::MealLog,
            )
            .await?;
        }

        if should_perform(rng, behaviors.step_logging) {
            let steps = rng.random_range(3_000..=15_000);
            let result = self
                .gateway
                .dispatch_telemetry(&turn.session, TelemetryEvent::StepsLogged { steps })
                .await;
            let (effective, details) = assess(&result);
            let details = with_field(details, "steps", json!(steps));
            self.log_attempt(turn, ActivityKind::StepsLog, None, effective, details)
                .await?;
        }

        if should_perform(rng, behaviors.calculator_use) {
            let calculator = CalculatorKind::ALL
                .choose(rng)
                .copied()
                .unwrap_or(CalculatorKind::Bmi);
            let result = self
                .gateway
                .dispatch_telemetry(&turn.session, TelemetryEvent::CalculatorSaved { calculator })
                .await;
            let (effective, details) = assess(&result);
            let details = with_field(details, "calculator", json!(calculator.as_str()));
            self.log_attempt(turn, ActivityKind::CalculatorUse, None, effective, details)
                .await?;
        }
        Ok(())
    }

    /// Dispatch the same event `times` times; counted once if any landed.
    /// A transport failure stops the series.
    async fn dispatch_repeated(
        &self,
        turn: &mut Turn<'_>,
        event: TelemetryEvent,
        times: u32,
        kind: ActivityKind,
    ) -> Result<(), StoreError> {
        let mut landed: u32 = 0;
        let mut last_error = None;
        for _ in 0..times {
            match self.gateway.dispatch_telemetry(&turn.session, event).await {
                Ok(outcome) if outcome.is_effective() => landed = landed.saturating_add(1),
                Ok(outcome) => last_error = outcome.message().map(str::to_owned),
                Err(err) => {
                    last_error = Some(err.to_string());
                    break;
                }
            }
        }
        let details = json!({ "requested": times, "landed": landed, "message": last_error });
        self.log_attempt(turn, kind, None, landed > 0, details).await
    }

    // -----------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------

    /// Generate one plan, guarded by the shared daily quota.
    async fn generate<R: Rng + Send>(&self, turn: &mut Turn<'_>, rng: &mut R) -> Result<(), StoreError> {
        if !turn.profile.ai_enabled || !should_perform(rng, self.settings.generation_probability) {
            return Ok(());
        }

        let quota = QuotaService::new(self.store);
        let limits = self.settings.limits;
        let mut candidates: Vec<(GenerationCategory, f64)> = Vec::new();
        for category in GenerationCategory::ALL {
            if quota.remaining(turn.day, category, limits.limit(category)).await? > 0 {
                candidates.push((category, 0.5));
            }
        }
        let Some(category) = select_category(rng, &candidates) else {
            debug!(actor_id = %turn.actor.id, "Generation quota exhausted for today");
            return Ok(());
        };
        let Some(reservation) = quota.acquire(turn.day, category, limits.limit(category)).await?
        else {
            debug!(actor_id = %turn.actor.id, %category, "Generation quota refused");
            return Ok(());
        };

        let form = forms::random_form(category, rng);
        let call = AssertUnwindSafe(self.gateway.generate_content(&turn.session, category, &form))
            .catch_unwind()
            .await;
        let result = match call {
            Ok(result) => result,
            Err(panic) => {
                // The unit goes back before the panic reaches the scheduler.
                match reservation.rollback(&quota).await {
                    Ok(()) => warn!(actor_id = %turn.actor.id, %category, "Generation panicked, quota returned"),
                    Err(err) => error!(
                        actor_id = %turn.actor.id,
                        %category,
                        error = %err,
                        "Generation panicked and the quota rollback failed"
                    ),
                }
                std::panic::resume_unwind(panic);
            }
        };

        if let Ok(Outcome::Applied(Some(id))) = result {
            reservation.commit();
            turn.state.record_generation(turn.day, category, id);
            self.persist(turn).await?;
            let details = json!({ "outcome": "applied", "form": form.fields });
            self.log_attempt(turn, category.kind(), Some(("generated", id)), true, details)
                .await?;
            info!(actor_id = %turn.actor.id, %category, entity_id = %id, "Content generated");
            return Ok(());
        }

        reservation.rollback(&quota).await?;
        let (_, mut details) = assess(&result);
        if matches!(result, Ok(Outcome::Applied(None))) {
            details = json!({ "outcome": "applied_without_id" });
        }
        warn!(actor_id = %turn.actor.id, %category, details = %details, "Generation failed, quota returned");
        self.log_attempt(turn, category.kind(), None, false, details)
            .await
    }
}
