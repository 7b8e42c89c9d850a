//! Global quota reservation service.
//!
//! Some actions (content generation) are limited system-wide per calendar
//! day. A unit of quota is reserved *before* the remote call and given back
//! with [`QuotaReservation::rollback`] if the call does not succeed:
//!
//! ```text
//!   acquire ──Refused──> skip
//!      │
//!   Reserved ──remote ok──> commit (unit stays consumed)
//!      │
//!      └──remote failed/errored──> rollback (unit returned)
//! ```
//!
//! A crash between reserving and calling the platform leaves the unit
//! consumed; there is no intent log to recover it.

use chrono::NaiveDate;
use serde::Deserialize;
use swarm_types::{GenerationCategory, Reservation};

use crate::store::{StateStore, StoreError};

/// Daily system-wide limits per quota-gated category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuotaLimits {
    /// Diet plans generated per day across all actors.
    #[serde(default = "default_diet_generation")]
    pub diet_generation: u32,

    /// Exercise plans generated per day across all actors.
    #[serde(default = "default_exercise_generation")]
    pub exercise_generation: u32,
}

impl QuotaLimits {
    /// Limit for `category`.
    pub const fn limit(self, category: GenerationCategory) -> u32 {
        match category {
            GenerationCategory::DietGeneration => self.diet_generation,
            GenerationCategory::ExerciseGeneration => self.exercise_generation,
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            diet_generation: default_diet_generation(),
            exercise_generation: default_exercise_generation(),
        }
    }
}

const fn default_diet_generation() -> u32 {
    2
}

const fn default_exercise_generation() -> u32 {
    3
}

/// Reserve-or-refuse access to the shared daily counters.
#[derive(Debug)]
pub struct QuotaService<'a, S> {
    store: &'a S,
}

impl<'a, S: StateStore> QuotaService<'a, S> {
    /// Create a service backed by `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Atomically take one unit if the count is below `limit`.
    pub async fn reserve(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<Reservation, StoreError> {
        let reservation = self.store.reserve_quota(day, category, limit).await?;
        tracing::debug!(%day, category = %category, limit, ?reservation, "Quota reservation attempt");
        Ok(reservation)
    }

    /// Give back one unit taken by a prior [`reserve`](Self::reserve).
    pub async fn rollback(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
    ) -> Result<(), StoreError> {
        self.store.rollback_quota(day, category).await?;
        tracing::debug!(%day, category = %category, "Quota reservation rolled back");
        Ok(())
    }

    /// Units left today. Advisory only; another caller may take them first.
    pub async fn remaining(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<u32, StoreError> {
        let used = self.store.quota_count(day, category).await?;
        Ok(limit.saturating_sub(used))
    }

    /// Reserve a unit and wrap it in a guard, or `None` when refused.
    pub async fn acquire(
        &self,
        day: NaiveDate,
        category: GenerationCategory,
        limit: u32,
    ) -> Result<Option<QuotaReservation>, StoreError> {
        match self.reserve(day, category, limit).await? {
            Reservation::Reserved => Ok(Some(QuotaReservation { day, category })),
            Reservation::Refused => Ok(None),
        }
    }
}

/// A reserved unit of quota that must be either committed or rolled back.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or rolled back"]
pub struct QuotaReservation {
    day: NaiveDate,
    category: GenerationCategory,
}

impl QuotaReservation {
    /// Category the unit was taken from.
    pub const fn category(&self) -> GenerationCategory {
        self.category
    }

    /// Keep the unit consumed.
    pub const fn commit(self) {}

    /// Return the unit.
    pub async fn rollback<S: StateStore>(self, quota: &QuotaService<'_, S>) -> Result<(), StoreError> {
        quota.rollback(self.day, self.category).await
    }
}
