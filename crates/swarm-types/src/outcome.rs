//! Results of remote actions and quota reservations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::GenerationCategory;
use crate::ids::EntityId;

/// Result of a remote action that reached the platform.
///
/// Transport failures are not outcomes; gateways report them as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "value")]
pub enum Outcome<T = ()> {
    /// The platform applied the action, optionally returning a payload.
    Applied(Option<T>),
    /// The platform had already applied this action earlier.
    AlreadyApplied(String),
    /// The platform refused the action.
    Failed(String),
}

impl<T> Outcome<T> {
    /// Whether the platform now reflects the action, either because it was
    /// applied just now or earlier.
    pub const fn is_effective(&self) -> bool {
        matches!(self, Self::Applied(_) | Self::AlreadyApplied(_))
    }

    /// Message attached to a non-applied outcome.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Applied(_) => None,
            Self::AlreadyApplied(message) | Self::Failed(message) => Some(message),
        }
    }

    /// Transform the applied payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Applied(payload) => Outcome::Applied(payload.map(f)),
            Self::AlreadyApplied(message) => Outcome::AlreadyApplied(message),
            Self::Failed(message) => Outcome::Failed(message),
        }
    }
}

/// Answer of an atomic quota reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reservation {
    /// A unit of quota was taken.
    Reserved,
    /// The daily limit is reached; nothing changed.
    Refused,
}

/// One entry of a remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Remote id.
    pub id: EntityId,
    /// Display title (may be empty).
    pub title: String,
    /// The user behind the item: a comment's author or an expert's account.
    #[serde(default)]
    pub author_id: Option<EntityId>,
    /// URL slug, for items addressed by slug rather than id.
    #[serde(default)]
    pub slug: Option<String>,
}

impl Listing {
    /// A listing with no author or slug.
    pub fn new(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author_id: None,
            slug: None,
        }
    }

    /// Set the author.
    #[must_use]
    pub const fn with_author(mut self, author_id: EntityId) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Payload returned when a telemetry event is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryAck {
    /// Updated login streak, when the platform reports one.
    pub current_streak: Option<u32>,
}

/// Form submitted to the platform's content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationForm {
    /// What to generate.
    pub category: GenerationCategory,
    /// Form field values keyed by the platform's field names.
    pub fields: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_applied_counts_as_effective() {
        let outcome: Outcome = Outcome::AlreadyApplied("zaten".to_owned());
        assert!(outcome.is_effective());
        assert_eq!(outcome.message(), Some("zaten"));
        assert!(!Outcome::<()>::Failed("nope".to_owned()).is_effective());
    }

    #[test]
    fn map_only_touches_applied_payload() {
        let applied = Outcome::Applied(Some(21)).map(|n| n * 2);
        assert_eq!(applied, Outcome::Applied(Some(42)));
        let failed = Outcome::<i32>::Failed("x".to_owned()).map(|n| n * 2);
        assert_eq!(failed, Outcome::Failed("x".to_owned()));
    }
}
