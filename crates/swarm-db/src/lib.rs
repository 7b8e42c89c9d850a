//! `PostgreSQL` data layer for the Swarm simulation.
//!
//! Holds the actor population, one JSONB tracking document per actor, the
//! per-day global quota counters, and the append-only activity log.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator / QuotaService
//!     |
//!     +-- StateStore trait --> PgStateStore (PostgresPool)
//!         |-- ActorStore       (population, sessions, enable/disable)
//!         |-- ActorStateStore  (tracking state documents)
//!         |-- QuotaStore       (atomic reserve / rollback)
//!         +-- ActivityStore    (audit log, daily report)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`actor_store`] -- Actor records and administration helpers
//! - [`state_store`] -- Per-actor tracking state
//! - [`quota_store`] -- Global quota counters
//! - [`activity_store`] -- Activity log insertion and reporting
//! - [`pg_state_store`] -- The [`StateStore`](swarm_core::StateStore)
//!   implementation composing the stores above
//! - [`error`] -- Shared error types

pub mod activity_store;
pub mod actor_store;
pub mod error;
pub mod pg_state_store;
pub mod postgres;
pub mod quota_store;
pub mod state_store;

// Re-export primary types for convenience.
pub use activity_store::{ActivityReportRow, ActivityStore};
pub use actor_store::{ActorRow, ActorStore, PersonaStatsRow};
pub use error::DbError;
pub use pg_state_store::PgStateStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use quota_store::{QuotaRow, QuotaStore};
pub use state_store::ActorStateStore;
