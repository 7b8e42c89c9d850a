//! Audit records and run statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::ActivityKind;
use crate::ids::{ActorId, EntityId};

/// Append-only audit record of one attempted activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Acting actor.
    pub actor_id: ActorId,
    /// What was attempted.
    pub kind: ActivityKind,
    /// Kind of the targeted entity (`blog`, `diet`, `user`, ...).
    pub entity_type: Option<String>,
    /// Targeted entity.
    pub entity_id: Option<EntityId>,
    /// Whether the platform now reflects the activity.
    pub success: bool,
    /// Free-form detail.
    pub details: serde_json::Value,
    /// When the attempt finished.
    pub created_at: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// A new entry with no target and no details, stamped now.
    pub fn new(actor_id: ActorId, kind: ActivityKind, success: bool) -> Self {
        Self {
            actor_id,
            kind,
            entity_type: None,
            entity_id: None,
            success,
            details: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Attach the targeted entity.
    #[must_use]
    pub fn with_target(mut self, entity_type: &str, entity_id: EntityId) -> Self {
        self.entity_type = Some(entity_type.to_owned());
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Aggregate statistics of one scheduler pass over the population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Actors considered after shuffling and truncation.
    pub total: usize,
    /// Actors whose turn completed.
    pub processed: usize,
    /// Actors skipped (inactive today or disabled).
    pub skipped: usize,
    /// Actors whose turn failed.
    pub errored: usize,
    /// Successful activities per kind.
    pub activities: BTreeMap<ActivityKind, u64>,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Empty summary for a run starting at `started_at`.
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            total: 0,
            processed: 0,
            skipped: 0,
            errored: 0,
            activities: BTreeMap::new(),
            started_at,
            finished_at: started_at,
        }
    }

    /// Count one activity.
    pub fn record(&mut self, kind: ActivityKind) {
        let count = self.activities.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Count every activity in `kinds`.
    pub fn record_all(&mut self, kinds: &[ActivityKind]) {
        for kind in kinds {
            self.record(*kind);
        }
    }

    /// Count for one activity kind.
    pub fn count(&self, kind: ActivityKind) -> u64 {
        self.activities.get(&kind).copied().unwrap_or(0)
    }

    /// Sum of all activity counters.
    pub fn total_activities(&self) -> u64 {
        self.activities
            .values()
            .fold(0_u64, |acc, n| acc.saturating_add(*n))
    }
}
