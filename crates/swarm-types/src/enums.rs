//! Enumeration types shared across the swarm.
//!
//! String forms returned by `as_str` are the ones persisted in the database
//! and emitted in structured logs, so they must stay stable.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Error returned when a stored string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Behavioral archetype of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaClass {
    /// Logs in almost daily, does everything, may generate content.
    SuperActive,
    /// Regular user with broad engagement.
    Active,
    /// Average engagement.
    Normal,
    /// Shows up occasionally.
    LowActivity,
    /// Rarely seen.
    Dormant,
    /// Mostly interested in diet plans and meal tracking.
    DietFocused,
    /// Mostly interested in exercise plans and step tracking.
    ExerciseFocused,
}

impl PersonaClass {
    /// Every persona class, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::SuperActive,
        Self::Active,
        Self::Normal,
        Self::LowActivity,
        Self::Dormant,
        Self::DietFocused,
        Self::ExerciseFocused,
    ];

    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperActive => "super_active",
            Self::Active => "active",
            Self::Normal => "normal",
            Self::LowActivity => "low_activity",
            Self::Dormant => "dormant",
            Self::DietFocused => "diet_focused",
            Self::ExerciseFocused => "exercise_focused",
        }
    }
}

impl fmt::Display for PersonaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaClass {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "persona class",
                value: s.to_owned(),
            })
    }
}

/// Content category with a start/complete lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleCategory {
    /// Diet plans.
    Diet,
    /// Exercise plans.
    Exercise,
}

impl LifecycleCategory {
    /// Both lifecycle categories, in turn order.
    pub const ALL: [Self; 2] = [Self::Diet, Self::Exercise];

    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diet => "diet",
            Self::Exercise => "exercise",
        }
    }

    /// Remote catalog listing items of this category.
    pub const fn catalog(self) -> Catalog {
        match self {
            Self::Diet => Catalog::Diets,
            Self::Exercise => Catalog::Exercises,
        }
    }

    /// Activity recorded when an item of this category is started.
    pub const fn start_kind(self) -> ActivityKind {
        match self {
            Self::Diet => ActivityKind::DietStart,
            Self::Exercise => ActivityKind::ExerciseStart,
        }
    }

    /// Activity recorded when an item of this category is completed.
    pub const fn complete_kind(self) -> ActivityKind {
        match self {
            Self::Diet => ActivityKind::DietComplete,
            Self::Exercise => ActivityKind::ExerciseComplete,
        }
    }

    /// Activity recorded when a completed item of this category is reviewed.
    pub const fn review_kind(self) -> ActivityKind {
        match self {
            Self::Diet => ActivityKind::DietReview,
            Self::Exercise => ActivityKind::ExerciseReview,
        }
    }
}

impl fmt::Display for LifecycleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource category guarded by a system-wide daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationCategory {
    /// AI-generated diet plan.
    DietGeneration,
    /// AI-generated exercise plan.
    ExerciseGeneration,
}

impl GenerationCategory {
    /// Every quota-gated category.
    pub const ALL: [Self; 2] = [Self::DietGeneration, Self::ExerciseGeneration];

    /// Stable string form, used as the quota row key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DietGeneration => "diet-generation",
            Self::ExerciseGeneration => "exercise-generation",
        }
    }

    /// Activity recorded on a successful generation.
    pub const fn kind(self) -> ActivityKind {
        match self {
            Self::DietGeneration => ActivityKind::DietGeneration,
            Self::ExerciseGeneration => ActivityKind::ExerciseGeneration,
        }
    }
}

impl fmt::Display for GenerationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "generation category",
                value: s.to_owned(),
            })
    }
}

/// A browsable listing on the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "catalog")]
pub enum Catalog {
    /// Published blog posts.
    Blogs,
    /// Diet plans.
    Diets,
    /// Exercise plans.
    Exercises,
    /// Gamification leaderboard (user profiles).
    Leaderboard,
    /// Public circles.
    Circles,
    /// The circle the session's user currently belongs to (zero or one item).
    MyCircle,
    /// Expert (professional) profiles.
    Experts,
    /// Comments under one blog post.
    Comments {
        /// The blog post whose comments are listed.
        post: EntityId,
    },
}

/// A one-shot social action performed on a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum SocialAction {
    /// Mark a blog post as read.
    ReadBlog,
    /// Like a comment.
    LikeComment,
    /// Comment on a blog post.
    CommentBlog {
        /// Comment text.
        body: String,
    },
    /// Follow a user profile.
    FollowUser,
    /// Send a high five to a user profile. The platform accepts one per day.
    HighFive,
    /// Join a circle.
    JoinCircle,
    /// Record a visit to an expert's profile page.
    VisitExpert {
        /// Profile slug the platform tracks views by.
        slug: String,
        /// Visitor session identifier.
        view_session: String,
    },
    /// Leave a rated review on a completed plan.
    Review {
        /// Plan category being reviewed.
        category: LifecycleCategory,
        /// Star rating, 1 to 5.
        rating: u8,
        /// Review text.
        body: String,
    },
}

impl SocialAction {
    /// Stable string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadBlog => "read_blog",
            Self::LikeComment => "like_comment",
            Self::CommentBlog { .. } => "comment_blog",
            Self::FollowUser => "follow_user",
            Self::HighFive => "high_five",
            Self::JoinCircle => "join_circle",
            Self::VisitExpert { .. } => "visit_expert",
            Self::Review { .. } => "review",
        }
    }
}

/// Health calculator variants the platform can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    /// Body mass index.
    Bmi,
    /// Daily calorie need.
    Calorie,
    /// Daily water need.
    Water,
    /// Ideal weight.
    IdealWeight,
}

impl CalculatorKind {
    /// Every calculator variant.
    pub const ALL: [Self; 4] = [Self::Bmi, Self::Calorie, Self::Water, Self::IdealWeight];

    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bmi => "bmi",
            Self::Calorie => "calorie",
            Self::Water => "water",
            Self::IdealWeight => "ideal_weight",
        }
    }
}

/// A telemetry event dispatched to the platform's event endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum TelemetryEvent {
    /// Daily login; refreshes the streak.
    LoginSuccess,
    /// One glass of water.
    WaterAdded {
        /// Volume in millilitres.
        amount_ml: u32,
    },
    /// One meal photo.
    MealPhotoUploaded,
    /// A day's step count.
    StepsLogged {
        /// Number of steps.
        steps: u32,
    },
    /// A saved calculator result.
    CalculatorSaved {
        /// Which calculator was used.
        calculator: CalculatorKind,
    },
}

impl TelemetryEvent {
    /// The platform's event type name.
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::WaterAdded { .. } => "water_added",
            Self::MealPhotoUploaded => "meal_photo_uploaded",
            Self::StepsLogged { .. } => "steps_logged",
            Self::CalculatorSaved { .. } => "calculator_saved",
        }
    }
}

/// Per-run activity counter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Session established (fresh or cached).
    Login,
    /// Blog post read.
    BlogRead,
    /// Comment liked.
    CommentLike,
    /// Blog post commented on.
    BlogComment,
    /// Completed diet reviewed.
    DietReview,
    /// Diet plan started.
    DietStart,
    /// Diet plan completed.
    DietComplete,
    /// Completed exercise reviewed.
    ExerciseReview,
    /// Exercise plan started.
    ExerciseStart,
    /// Exercise plan completed.
    ExerciseComplete,
    /// User followed.
    UserFollow,
    /// High five sent.
    HighFive,
    /// Circle joined.
    CircleJoin,
    /// Expert profile visited.
    ExpertVisit,
    /// Expert followed from their profile.
    ExpertFollow,
    /// Water intake logged.
    WaterLog,
    /// Meals logged.
    MealLog,
    /// Steps logged.
    StepsLog,
    /// Calculator result saved.
    CalculatorUse,
    /// Diet plan generated.
    DietGeneration,
    /// Exercise plan generated.
    ExerciseGeneration,
}

impl ActivityKind {
    /// Stable string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::BlogRead => "blog_read",
            Self::CommentLike => "comment_like",
            Self::BlogComment => "blog_comment",
            Self::DietReview => "diet_review",
            Self::DietStart => "diet_start",
            Self::DietComplete => "diet_complete",
            Self::ExerciseReview => "exercise_review",
            Self::ExerciseStart => "exercise_start",
            Self::ExerciseComplete => "exercise_complete",
            Self::UserFollow => "user_follow",
            Self::HighFive => "high_five",
            Self::CircleJoin => "circle_join",
            Self::ExpertVisit => "expert_visit",
            Self::ExpertFollow => "expert_follow",
            Self::WaterLog => "water_log",
            Self::MealLog => "meal_log",
            Self::StepsLog => "steps_log",
            Self::CalculatorUse => "calculator_use",
            Self::DietGeneration => "diet_generation",
            Self::ExerciseGeneration => "exercise_generation",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn persona_class_parses_its_own_string_form() {
        for class in PersonaClass::ALL {
            assert_eq!(class.as_str().parse::<PersonaClass>().unwrap(), class);
        }
        let err = "hyperactive".parse::<PersonaClass>().unwrap_err();
        assert_eq!(err.value, "hyperactive");
    }

    #[test]
    fn persona_class_serde_matches_as_str() {
        let json = serde_json::to_string(&PersonaClass::LowActivity).unwrap();
        assert_eq!(json, "\"low_activity\"");
    }

    #[test]
    fn generation_category_uses_quota_keys() {
        assert_eq!(GenerationCategory::DietGeneration.as_str(), "diet-generation");
        let json = serde_json::to_string(&GenerationCategory::ExerciseGeneration).unwrap();
        assert_eq!(json, "\"exercise-generation\"");
    }

    #[test]
    fn lifecycle_kinds_are_category_specific() {
        assert_eq!(LifecycleCategory::Diet.start_kind(), ActivityKind::DietStart);
        assert_eq!(
            LifecycleCategory::Exercise.complete_kind(),
            ActivityKind::ExerciseComplete
        );
        assert_eq!(LifecycleCategory::Exercise.catalog(), Catalog::Exercises);
    }

    #[test]
    fn telemetry_event_types() {
        assert_eq!(TelemetryEvent::WaterAdded { amount_ml: 200 }.event_type(), "water_added");
        assert_eq!(
            TelemetryEvent::CalculatorSaved {
                calculator: CalculatorKind::IdealWeight
            }
            .event_type(),
            "calculator_saved"
        );
    }
}
