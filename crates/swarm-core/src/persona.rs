//! Persona behavior model.
//!
//! Maps a [`PersonaClass`] to an activity frequency and a set of
//! independent per-behavior probabilities. Sampling is a pure function of
//! the profile and an injected random source; nothing here performs I/O.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Deserialize;
use swarm_types::PersonaClass;

/// Probability that an AI-enabled actor reviews a completed plan.
pub const REVIEW_PROBABILITY: f64 = 0.6;

/// Probability that an AI-enabled actor attempts content generation.
pub const GENERATION_PROBABILITY: f64 = 0.08;

/// Probability of following an expert right after visiting their profile.
pub const EXPERT_FOLLOW_PROBABILITY: f64 = 0.3;

/// Inclusive range of review star ratings.
pub const REVIEW_RATING: core::ops::RangeInclusive<u8> = 4..=5;

/// Per-behavior probabilities, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Behaviors {
    /// Read an unread blog post.
    pub blog_reading: f64,
    /// Like a comment under a blog post.
    pub like_comments: f64,
    /// Comment on a read blog post (AI-enabled personas).
    pub blog_commenting: f64,
    /// Start a new diet plan when none is active.
    pub diet_start: f64,
    /// Complete the active diet plan.
    pub diet_complete: f64,
    /// Start a new exercise plan when none is active.
    pub exercise_start: f64,
    /// Complete the active exercise plan.
    pub exercise_complete: f64,
    /// Log water intake.
    pub water_tracking: f64,
    /// Log meals.
    pub meal_logging: f64,
    /// Log steps.
    pub step_logging: f64,
    /// Join a circle (once).
    pub circle_join: f64,
    /// Follow another user.
    pub follow_users: f64,
    /// High-five a followed user.
    pub send_high_five: f64,
    /// Use a health calculator.
    pub calculator_use: f64,
    /// Visit an expert's profile.
    pub expert_visit: f64,
}

/// Full behavioral profile of a persona.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersonaProfile {
    /// Probability of being active on a given run.
    pub activity_frequency: f64,
    /// Whether the persona reviews plans and generates content.
    pub ai_enabled: bool,
    /// Per-behavior probabilities.
    pub behaviors: Behaviors,
}

impl PersonaProfile {
    /// The built-in profile for `class`.
    #[allow(clippy::too_many_lines)]
    pub const fn builtin(class: PersonaClass) -> Self {
        match class {
            PersonaClass::SuperActive => Self {
                activity_frequency: 0.95,
                ai_enabled: true,
                behaviors: Behaviors {
                    blog_reading: 0.80,
                    like_comments: 0.60,
                    blog_commenting: 0.30,
                    diet_start: 0.40,
                    diet_complete: 0.85,
                    exercise_start: 0.50,
                    exercise_complete: 0.80,
                    water_tracking: 0.90,
                    meal_logging: 0.70,
                    step_logging: 0.85,
                    circle_join: 0.60,
                    follow_users: 0.50,
                    send_high_five: 0.40,
                    calculator_use: 0.25,
                    expert_visit: 0.30,
                },
            },
            PersonaClass::Active => Self {
                activity_frequency: 0.75,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.50,
                    like_comments: 0.40,
                    blog_commenting: 0.10,
                    diet_start: 0.25,
                    diet_complete: 0.70,
                    exercise_start: 0.30,
                    exercise_complete: 0.65,
                    water_tracking: 0.60,
                    meal_logging: 0.40,
                    step_logging: 0.50,
                    circle_join: 0.30,
                    follow_users: 0.30,
                    send_high_five: 0.20,
                    calculator_use: 0.15,
                    expert_visit: 0.15,
                },
            },
            PersonaClass::Normal => Self {
                activity_frequency: 0.50,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.30,
                    like_comments: 0.20,
                    blog_commenting: 0.05,
                    diet_start: 0.15,
                    diet_complete: 0.50,
                    exercise_start: 0.15,
                    exercise_complete: 0.45,
                    water_tracking: 0.30,
                    meal_logging: 0.20,
                    step_logging: 0.25,
                    circle_join: 0.15,
                    follow_users: 0.15,
                    send_high_five: 0.10,
                    calculator_use: 0.10,
                    expert_visit: 0.08,
                },
            },
            PersonaClass::LowActivity => Self {
                activity_frequency: 0.25,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.15,
                    like_comments: 0.08,
                    blog_commenting: 0.02,
                    diet_start: 0.08,
                    diet_complete: 0.30,
                    exercise_start: 0.05,
                    exercise_complete: 0.25,
                    water_tracking: 0.10,
                    meal_logging: 0.08,
                    step_logging: 0.10,
                    circle_join: 0.05,
                    follow_users: 0.08,
                    send_high_five: 0.05,
                    calculator_use: 0.05,
                    expert_visit: 0.03,
                },
            },
            PersonaClass::Dormant => Self {
                activity_frequency: 0.08,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.05,
                    like_comments: 0.02,
                    blog_commenting: 0.00,
                    diet_start: 0.02,
                    diet_complete: 0.10,
                    exercise_start: 0.02,
                    exercise_complete: 0.10,
                    water_tracking: 0.03,
                    meal_logging: 0.02,
                    step_logging: 0.03,
                    circle_join: 0.01,
                    follow_users: 0.02,
                    send_high_five: 0.01,
                    calculator_use: 0.01,
                    expert_visit: 0.01,
                },
            },
            PersonaClass::DietFocused => Self {
                activity_frequency: 0.65,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.60,
                    like_comments: 0.30,
                    blog_commenting: 0.15,
                    diet_start: 0.50,
                    diet_complete: 0.75,
                    exercise_start: 0.10,
                    exercise_complete: 0.30,
                    water_tracking: 0.80,
                    meal_logging: 0.70,
                    step_logging: 0.20,
                    circle_join: 0.25,
                    follow_users: 0.20,
                    send_high_five: 0.15,
                    calculator_use: 0.40,
                    expert_visit: 0.25,
                },
            },
            PersonaClass::ExerciseFocused => Self {
                activity_frequency: 0.65,
                ai_enabled: false,
                behaviors: Behaviors {
                    blog_reading: 0.40,
                    like_comments: 0.25,
                    blog_commenting: 0.10,
                    diet_start: 0.15,
                    diet_complete: 0.40,
                    exercise_start: 0.55,
                    exercise_complete: 0.80,
                    water_tracking: 0.60,
                    meal_logging: 0.25,
                    step_logging: 0.85,
                    circle_join: 0.30,
                    follow_users: 0.25,
                    send_high_five: 0.30,
                    calculator_use: 0.30,
                    expert_visit: 0.15,
                },
            },
        }
    }
}

/// Persona profiles by class: the built-in table plus configured overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaBook {
    overrides: BTreeMap<PersonaClass, PersonaProfile>,
}

impl PersonaBook {
    /// The built-in table with no overrides.
    pub const fn builtin() -> Self {
        Self {
            overrides: BTreeMap::new(),
        }
    }

    /// The built-in table with `overrides` replacing whole profiles.
    pub const fn with_overrides(overrides: BTreeMap<PersonaClass, PersonaProfile>) -> Self {
        Self { overrides }
    }

    /// Profile for `class`.
    pub fn profile(&self, class: PersonaClass) -> PersonaProfile {
        self.overrides
            .get(&class)
            .copied()
            .unwrap_or_else(|| PersonaProfile::builtin(class))
    }
}

/// One independent Bernoulli trial. Probabilities outside `[0, 1]` are
/// clamped; `NaN` never succeeds.
pub fn should_perform<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.random_bool(probability.clamp(0.0, 1.0))
}

/// Pick one of several mutually exclusive candidates, weighted.
///
/// Candidates with a non-positive or non-finite weight are ineligible;
/// the remaining weights are normalized and sampled once. Returns `None`
/// when nothing is eligible.
pub fn select_category<R, C>(rng: &mut R, candidates: &[(C, f64)]) -> Option<C>
where
    R: Rng + ?Sized,
    C: Copy,
{
    let eligible: Vec<(C, f64)> = candidates
        .iter()
        .copied()
        .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
        .collect();
    let total: f64 = eligible.iter().map(|(_, weight)| weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let mut draw = rng.random_range(0.0..total);
    for (candidate, weight) in &eligible {
        if draw < *weight {
            return Some(*candidate);
        }
        draw -= weight;
    }
    // Rounding can leave a sliver past the last bucket.
    eligible.last().map(|(candidate, _)| *candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn only_super_active_is_ai_enabled() {
        for class in PersonaClass::ALL {
            let profile = PersonaProfile::builtin(class);
            assert_eq!(profile.ai_enabled, class == PersonaClass::SuperActive, "{class}");
        }
    }

    #[test]
    fn builtin_probabilities_are_in_range() {
        for class in PersonaClass::ALL {
            let p = PersonaProfile::builtin(class);
            let b = p.behaviors;
            for value in [
                p.activity_frequency,
                b.blog_reading,
                b.like_comments,
                b.blog_commenting,
                b.diet_start,
                b.diet_complete,
                b.exercise_start,
                b.exercise_complete,
                b.water_tracking,
                b.meal_logging,
                b.step_logging,
                b.circle_join,
                b.follow_users,
                b.send_high_five,
                b.calculator_use,
                b.expert_visit,
            ] {
                assert!((0.0..=1.0).contains(&value), "{class}: {value}");
            }
        }
    }

    #[test]
    fn overrides_replace_whole_profile() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            PersonaClass::Dormant,
            PersonaProfile {
                activity_frequency: 1.0,
                ..PersonaProfile::default()
            },
        );
        let book = PersonaBook::with_overrides(overrides);
        let dormant = book.profile(PersonaClass::Dormant);
        assert!(dormant.activity_frequency > 0.99);
        assert!(dormant.behaviors.blog_reading < f64::EPSILON);
        assert_eq!(
            book.profile(PersonaClass::Active),
            PersonaProfile::builtin(PersonaClass::Active)
        );
    }

    #[test]
    fn certain_and_impossible_trials() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(should_perform(&mut rng, 1.0));
            assert!(!should_perform(&mut rng, 0.0));
            assert!(should_perform(&mut rng, 3.5));
            assert!(!should_perform(&mut rng, -1.0));
            assert!(!should_perform(&mut rng, f64::NAN));
        }
    }

    #[test]
    fn trial_frequency_tracks_probability() {
        let mut rng = StdRng::seed_from_u64(7);
        let hits = (0..10_000).filter(|_| should_perform(&mut rng, 0.3)).count();
        assert!((2_700..3_300).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn select_category_skips_ineligible() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let picked = select_category(&mut rng, &[("diet", 0.0), ("exercise", 0.5)]);
            assert_eq!(picked, Some("exercise"));
        }
        assert_eq!(select_category::<_, &str>(&mut rng, &[]), None);
        assert_eq!(
            select_category(&mut rng, &[("diet", 0.0), ("exercise", f64::NAN)]),
            None
        );
    }

    #[test]
    fn select_category_with_overflowing_total_is_none() {
        let mut rng = StdRng::seed_from_u64(5);
        let huge = [("diet", f64::MAX), ("exercise", f64::MAX)];
        assert_eq!(select_category(&mut rng, &huge), None);
    }

    #[test]
    fn select_category_is_roughly_balanced() {
        let mut rng = StdRng::seed_from_u64(11);
        let diets = (0..10_000)
            .filter(|_| select_category(&mut rng, &[(0, 0.5), (1, 0.5)]) == Some(0))
            .count();
        assert!((4_500..5_500).contains(&diets), "diets = {diets}");
    }
}
