//! Per-actor tracking state.
//!
//! The sets here mirror what the remote platform already knows about the
//! actor, so the orchestrator can avoid repeating once-only actions. The
//! mutators on [`LifecycleTrack`] are the only way to move a plan through
//! its start/complete lifecycle and they enforce the legal transitions:
//!
//! ```text
//!   Inactive --activate(id)--> Active(id) --complete_active()--> Inactive
//! ```
//!
//! An id that reaches `completed` is always in `started` as well, and a
//! completed id is never activated again.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{GenerationCategory, LifecycleCategory};
use crate::ids::EntityId;

/// At-most-one active item pointer for a lifecycle category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "item")]
pub enum Lifecycle {
    /// Nothing in progress.
    #[default]
    Inactive,
    /// The given item has been started and not yet completed.
    Active(EntityId),
}

impl Lifecycle {
    /// The in-progress item, if any.
    pub const fn active_item(self) -> Option<EntityId> {
        match self {
            Self::Inactive => None,
            Self::Active(id) => Some(id),
        }
    }
}

/// Lifecycle bookkeeping for one category (diets or exercises).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleTrack {
    /// Items ever started.
    pub started: BTreeSet<EntityId>,
    /// Items completed.
    pub completed: BTreeSet<EntityId>,
    /// Completed items that have been reviewed.
    pub reviewed: BTreeSet<EntityId>,
    /// Current active pointer.
    pub active: Lifecycle,
}

impl LifecycleTrack {
    /// Whether `id` may be started: never started, never completed.
    pub fn is_eligible(&self, id: EntityId) -> bool {
        !self.started.contains(&id) && !self.completed.contains(&id)
    }

    /// Record `id` as started and make it the active item.
    ///
    /// Refused (returns `false`, no mutation) when another item is active
    /// or `id` was already completed.
    pub fn activate(&mut self, id: EntityId) -> bool {
        if self.active != Lifecycle::Inactive || self.completed.contains(&id) {
            return false;
        }
        self.started.insert(id);
        self.active = Lifecycle::Active(id);
        true
    }

    /// Complete the active item and clear the pointer.
    ///
    /// Returns the completed id, or `None` if nothing was active.
    pub fn complete_active(&mut self) -> Option<EntityId> {
        let id = self.active.active_item()?;
        self.started.insert(id);
        self.completed.insert(id);
        self.active = Lifecycle::Inactive;
        Some(id)
    }

    /// Completed items not yet reviewed.
    pub fn review_candidates(&self) -> Vec<EntityId> {
        self.completed.difference(&self.reviewed).copied().collect()
    }

    /// Mark a completed item as reviewed. Ignored for items not completed.
    pub fn mark_reviewed(&mut self, id: EntityId) -> bool {
        if !self.completed.contains(&id) {
            return false;
        }
        self.reviewed.insert(id)
    }
}

/// Locally observed generation activity for one day.
///
/// Display and logging only; the shared quota counters are authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTrackingState {
    /// Day the counters refer to.
    pub day: NaiveDate,
    /// Generations performed by this actor today, per category.
    pub generated: BTreeMap<GenerationCategory, u32>,
    /// Ids of entities produced today.
    pub produced: Vec<EntityId>,
}

impl QuotaTrackingState {
    /// Empty tracking state for `day`.
    pub const fn new(day: NaiveDate) -> Self {
        Self {
            day,
            generated: BTreeMap::new(),
            produced: Vec::new(),
        }
    }
}

/// Everything the orchestrator remembers about one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorState {
    /// Diet plan lifecycle.
    pub diet: LifecycleTrack,
    /// Exercise plan lifecycle.
    pub exercise: LifecycleTrack,
    /// Blog posts already read.
    pub read_blogs: BTreeSet<EntityId>,
    /// Comments already liked.
    pub liked_comments: BTreeSet<EntityId>,
    /// Blog posts already commented on.
    pub commented_blogs: BTreeSet<EntityId>,
    /// Users already followed.
    pub followed_users: BTreeSet<EntityId>,
    /// Joined circle. Set once.
    pub circle: Option<EntityId>,
    /// Today's generation activity.
    pub quota: Option<QuotaTrackingState>,
}

impl ActorState {
    /// Lifecycle bookkeeping for `category`.
    pub const fn track(&self, category: LifecycleCategory) -> &LifecycleTrack {
        match category {
            LifecycleCategory::Diet => &self.diet,
            LifecycleCategory::Exercise => &self.exercise,
        }
    }

    /// Mutable lifecycle bookkeeping for `category`.
    pub const fn track_mut(&mut self, category: LifecycleCategory) -> &mut LifecycleTrack {
        match category {
            LifecycleCategory::Diet => &mut self.diet,
            LifecycleCategory::Exercise => &mut self.exercise,
        }
    }

    /// Read posts not yet commented on.
    pub fn uncommented_blogs(&self) -> Vec<EntityId> {
        self.read_blogs
            .difference(&self.commented_blogs)
            .copied()
            .collect()
    }

    /// Record a successful generation, resetting the counters on a new day.
    pub fn record_generation(&mut self, day: NaiveDate, category: GenerationCategory, id: EntityId) {
        let tracking = match self.quota.take() {
            Some(existing) if existing.day == day => existing,
            _ => QuotaTrackingState::new(day),
        };
        let tracking = self.quota.insert(tracking);
        let count = tracking.generated.entry(category).or_insert(0);
        *count = count.saturating_add(1);
        tracking.produced.push(id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn activate_then_complete() {
        let mut track = LifecycleTrack::default();
        assert!(track.activate(EntityId(42)));
        assert_eq!(track.active, Lifecycle::Active(EntityId(42)));
        assert!(track.started.contains(&EntityId(42)));

        assert_eq!(track.complete_active(), Some(EntityId(42)));
        assert_eq!(track.active, Lifecycle::Inactive);
        assert!(track.completed.contains(&EntityId(42)));
        assert!(!track.is_eligible(EntityId(42)));
    }

    #[test]
    fn completed_items_are_never_reactivated() {
        let mut track = LifecycleTrack::default();
        track.activate(EntityId(1));
        track.complete_active();
        assert!(!track.activate(EntityId(1)));
        assert_eq!(track.active, Lifecycle::Inactive);
    }

    #[test]
    fn only_one_item_active_at_a_time() {
        let mut track = LifecycleTrack::default();
        assert!(track.activate(EntityId(1)));
        assert!(!track.activate(EntityId(2)));
        assert!(!track.started.contains(&EntityId(2)));
    }

    #[test]
    fn complete_without_active_is_a_no_op() {
        let mut track = LifecycleTrack::default();
        assert_eq!(track.complete_active(), None);
        assert!(track.completed.is_empty());
    }

    #[test]
    fn review_candidates_exclude_reviewed() {
        let mut track = LifecycleTrack::default();
        for id in [3, 4] {
            track.activate(EntityId(id));
            track.complete_active();
        }
        assert!(track.mark_reviewed(EntityId(3)));
        assert!(!track.mark_reviewed(EntityId(99)));
        assert_eq!(track.review_candidates(), vec![EntityId(4)]);
    }

    #[test]
    fn generation_tracking_resets_each_day() {
        let mut state = ActorState::default();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();

        state.record_generation(monday, GenerationCategory::DietGeneration, EntityId(10));
        state.record_generation(monday, GenerationCategory::DietGeneration, EntityId(11));
        let tracking = state.quota.as_ref().unwrap();
        assert_eq!(tracking.generated[&GenerationCategory::DietGeneration], 2);

        state.record_generation(tuesday, GenerationCategory::ExerciseGeneration, EntityId(12));
        let tracking = state.quota.as_ref().unwrap();
        assert_eq!(tracking.day, tuesday);
        assert_eq!(tracking.produced, vec![EntityId(12)]);
        assert!(!tracking.generated.contains_key(&GenerationCategory::DietGeneration));
    }

    #[test]
    fn only_read_posts_are_comment_candidates() {
        let mut state = ActorState::default();
        state.read_blogs.extend([EntityId(1), EntityId(2), EntityId(3)]);
        state.commented_blogs.insert(EntityId(2));
        assert_eq!(state.uncommented_blogs(), vec![EntityId(1), EntityId(3)]);
    }

    #[test]
    fn state_json_round_trips_with_missing_fields() {
        let state: ActorState =
            serde_json::from_str(r#"{"read_blogs":[1,2],"diet":{"active":{"status":"active","item":9}}}"#)
                .unwrap();
        assert_eq!(state.read_blogs.len(), 2);
        assert_eq!(state.diet.active, Lifecycle::Active(EntityId(9)));
        assert_eq!(state.exercise, LifecycleTrack::default());
    }
}
