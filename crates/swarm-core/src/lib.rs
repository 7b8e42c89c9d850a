//! Persona model, quota reservation, turn orchestration, and scheduling for
//! the Swarm simulation.
//!
//! This crate owns the decision-making half of the swarm. It never speaks
//! HTTP or SQL directly; both sides sit behind traits that the `swarm-db`
//! and `swarm-gateway` crates implement.
//!
//! # Modules
//!
//! - [`commentary`] -- [`Commentary`] trait and the canned review writer.
//! - [`config`] -- Configuration loading from `swarm-config.yaml` into
//!   strongly-typed structs.
//! - [`forms`] -- Randomized input forms for content generation.
//! - [`gateway`] -- [`Gateway`] trait over the remote platform.
//! - [`orchestrator`] -- One actor's turn: login, browsing, lifecycles,
//!   social actions, telemetry, and generation.
//! - [`persona`] -- Persona profiles and probability helpers.
//! - [`quota`] -- Daily system-wide quota reservation.
//! - [`scheduler`] -- Population run with shuffling, pacing, and fault
//!   isolation.
//! - [`store`] -- [`StateStore`] trait and the in-memory implementation.
//!
//! [`Commentary`]: commentary::Commentary
//! [`Gateway`]: gateway::Gateway
//! [`StateStore`]: store::StateStore

pub mod commentary;
pub mod config;
pub mod forms;
pub mod gateway;
pub mod orchestrator;
pub mod persona;
pub mod quota;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testing;

pub use commentary::{CannedCommentary, Commentary};
pub use config::{ConfigError, InfrastructureConfig, PoolConfig, SwarmConfig};
pub use gateway::{Gateway, GatewayError};
pub use orchestrator::{Orchestrator, OrchestratorError, OrchestratorSettings, TurnReport};
pub use persona::{PersonaBook, PersonaProfile};
pub use quota::{QuotaLimits, QuotaReservation, QuotaService};
pub use scheduler::{Scheduler, SchedulerSettings};
pub use store::{MemoryStateStore, StateStore, StoreError};
