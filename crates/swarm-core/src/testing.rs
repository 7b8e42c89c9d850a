//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_const_for_fn)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, Utc};
use swarm_types::{
    Actor, ActorId, Catalog, Credentials, EntityId, GenerationCategory, GenerationForm,
    LifecycleCategory, Listing, Outcome, PersonaClass, Session, SocialAction, TelemetryAck,
    TelemetryEvent,
};

use crate::gateway::{Gateway, GatewayError};
use crate::persona::{Behaviors, PersonaBook, PersonaProfile};

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

pub fn actor(id: i64, persona: PersonaClass) -> Actor {
    Actor {
        id: ActorId(id),
        persona,
        remote_user_id: None,
        credentials: Credentials {
            username: format!("bot_{id}"),
            password: "secret".to_owned(),
        },
        batch_id: Some("batch-1".to_owned()),
        enabled: true,
        session: None,
    }
}

pub fn listing(id: i64) -> Listing {
    Listing::new(EntityId(id), format!("item {id}"))
}

/// A profile that is always active and does nothing unless told to.
pub fn quiet_profile() -> PersonaProfile {
    PersonaProfile {
        activity_frequency: 1.0,
        ai_enabled: false,
        behaviors: Behaviors::default(),
    }
}

/// Every persona mapped to `profile`.
pub fn book_of(profile: PersonaProfile) -> PersonaBook {
    PersonaBook::with_overrides(PersonaClass::ALL.into_iter().map(|c| (c, profile)).collect())
}

/// A scripted reply for one gateway call.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Outcome(Outcome<T>),
    Transport,
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<Outcome<T>, GatewayError> {
        match self {
            Self::Outcome(outcome) => Ok(outcome),
            Self::Transport => Err(GatewayError::Transport("connection reset".to_owned())),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    catalogs: HashMap<Catalog, Vec<Listing>>,
    start: VecDeque<Reply<()>>,
    complete: VecDeque<Reply<()>>,
    once: VecDeque<Reply<()>>,
    generate: VecDeque<Reply<EntityId>>,
    telemetry: VecDeque<Reply<TelemetryAck>>,
    rejected_logins: BTreeSet<String>,
    panicking_logins: BTreeSet<String>,
    panicking_generation: bool,
    next_generated: i64,
    calls: Vec<String>,
}

/// Gateway that answers from queues and records every call.
///
/// Empty queues answer `Applied`; generation then hands out ids from 900.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self, catalog: Catalog, items: Vec<Listing>) {
        self.script.lock().unwrap().catalogs.insert(catalog, items);
    }

    pub fn push_start(&self, reply: Reply<()>) {
        self.script.lock().unwrap().start.push_back(reply);
    }

    pub fn push_complete(&self, reply: Reply<()>) {
        self.script.lock().unwrap().complete.push_back(reply);
    }

    pub fn push_once(&self, reply: Reply<()>) {
        self.script.lock().unwrap().once.push_back(reply);
    }

    pub fn push_generate(&self, reply: Reply<EntityId>) {
        self.script.lock().unwrap().generate.push_back(reply);
    }

    pub fn push_telemetry(&self, reply: Reply<TelemetryAck>) {
        self.script.lock().unwrap().telemetry.push_back(reply);
    }

    pub fn reject_login(&self, username: &str) {
        self.script
            .lock()
            .unwrap()
            .rejected_logins
            .insert(username.to_owned());
    }

    pub fn panic_on_login(&self, username: &str) {
        self.script
            .lock()
            .unwrap()
            .panicking_logins
            .insert(username.to_owned());
    }

    pub fn panic_on_generate(&self) {
        self.script.lock().unwrap().panicking_generation = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, Script> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        script
    }
}

pub fn session_for(user_id: i64) -> Session {
    Session {
        token: format!("token-{user_id}"),
        user_id: EntityId(user_id),
        current_streak: 1,
        expires_at: Utc::now() + Duration::days(7),
    }
}

impl Gateway for ScriptedGateway {
    async fn login(&self, credentials: &Credentials) -> Result<Session, GatewayError> {
        let (rejected, panics) = {
            let script = self.record(format!("login {}", credentials.username));
            (
                script.rejected_logins.contains(&credentials.username),
                script.panicking_logins.contains(&credentials.username),
            )
        };
        assert!(!panics, "scripted login panic for {}", credentials.username);
        if rejected {
            return Err(GatewayError::Auth("invalid credentials".to_owned()));
        }
        let user_id = credentials
            .username
            .trim_start_matches("bot_")
            .parse::<i64>()
            .map_or(1, |n| n + 10_000);
        Ok(session_for(user_id))
    }

    async fn browse(
        &self,
        _session: &Session,
        catalog: Catalog,
        limit: u32,
    ) -> Result<Vec<Listing>, GatewayError> {
        let script = self.record(format!("browse {catalog:?}"));
        let mut items = script.catalogs.get(&catalog).cloned().unwrap_or_default();
        items.truncate(usize::try_from(limit).unwrap());
        Ok(items)
    }

    async fn start_lifecycle(
        &self,
        _session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let mut script = self.record(format!("start {category} {item}"));
        script
            .start
            .pop_front()
            .unwrap_or(Reply::Outcome(Outcome::Applied(None)))
            .into_result()
    }

    async fn complete_lifecycle(
        &self,
        _session: &Session,
        category: LifecycleCategory,
        item: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let mut script = self.record(format!("complete {category} {item}"));
        script
            .complete
            .pop_front()
            .unwrap_or(Reply::Outcome(Outcome::Applied(None)))
            .into_result()
    }

    async fn perform_once(
        &self,
        _session: &Session,
        action: &SocialAction,
        target: EntityId,
    ) -> Result<Outcome, GatewayError> {
        let mut script = self.record(format!("{} {target}", action.as_str()));
        script
            .once
            .pop_front()
            .unwrap_or(Reply::Outcome(Outcome::Applied(None)))
            .into_result()
    }

    async fn generate_content(
        &self,
        _session: &Session,
        category: GenerationCategory,
        _form: &GenerationForm,
    ) -> Result<Outcome<EntityId>, GatewayError> {
        let mut script = self.record(format!("generate {category}"));
        if script.panicking_generation {
            drop(script);
            panic!("scripted generation panic for {category}");
        }
        if let Some(reply) = script.generate.pop_front() {
            return reply.into_result();
        }
        let id = 900 + script.next_generated;
        script.next_generated += 1;
        Ok(Outcome::Applied(Some(EntityId(id))))
    }

    async fn dispatch_telemetry(
        &self,
        _session: &Session,
        event: TelemetryEvent,
    ) -> Result<Outcome<TelemetryAck>, GatewayError> {
        let mut script = self.record(format!("event {}", event.event_type()));
        script
            .telemetry
            .pop_front()
            .unwrap_or(Reply::Outcome(Outcome::Applied(None)))
            .into_result()
    }
}
