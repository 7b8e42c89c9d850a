//! Shared type definitions for the Swarm activity simulation.
//!
//! This crate is the single source of truth for the data that flows
//! between the scheduler, the orchestrator, the state stores, and the
//! remote platform gateway.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for local and remote identifiers
//! - [`enums`] -- Persona classes, categories, catalogs, actions, events
//! - [`actor`] -- Actors, credentials, and cached sessions
//! - [`state`] -- Per-actor tracking state and the lifecycle state machine
//! - [`outcome`] -- Remote action outcomes and quota reservation answers
//! - [`report`] -- Activity log entries and run summaries

pub mod actor;
pub mod enums;
pub mod ids;
pub mod outcome;
pub mod report;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use actor::{Actor, Credentials, Session};
pub use enums::{
    ActivityKind, CalculatorKind, Catalog, GenerationCategory, LifecycleCategory, ParseEnumError,
    PersonaClass, SocialAction, TelemetryEvent,
};
pub use ids::{ActorId, EntityId};
pub use outcome::{GenerationForm, Listing, Outcome, Reservation, TelemetryAck};
pub use report::{ActivityLogEntry, RunSummary};
pub use state::{ActorState, Lifecycle, LifecycleTrack, QuotaTrackingState};
