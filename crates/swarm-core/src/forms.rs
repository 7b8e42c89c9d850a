//! Random form data for content generation requests.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use swarm_types::{GenerationCategory, GenerationForm};

const GENDERS: &[&str] = &["female", "male"];

const ACTIVITY_LEVELS: &[&str] = &["sedentary", "light", "moderate", "active"];
const DIET_GOALS: &[&str] = &["lose_weight", "maintain", "gain_muscle"];
const DIET_TYPES: &[&str] = &[
    "Hızlı Sonuç",
    "Standart",
    "Keto",
    "Vegan",
    "Vejetaryen",
    "Düşük Karbonhidrat",
    "Akdeniz",
    "Glutensiz",
    "Ekonomik",
    "Detoks",
    "Protein Ağırlıklı",
    "Aralıklı Oruç",
];
const MEAL_COUNTS: &[&str] = &["2", "3", "4", "5", "6"];
const DIET_DAYS: &[&str] = &["1", "3", "7", "15"];
const CUISINES: &[&str] = &["turkish", "world", "practical"];
const CHRONIC_DISEASES: &[&str] = &[
    "Diyabet",
    "İnsülin Direnci",
    "Tiroid",
    "Hipertansiyon",
    "Kolesterol",
    "IBS/Mide",
    "PCOS",
    "Çölyak",
];
const ALLERGIES: &[&str] = &["Süt/Laktoz", "Yumurta", "Gluten", "Kuruyemiş", "Balık", "Soya"];
const FOOD_DISLIKES: &[&str] = &["Sakatat", "Mantar", "Kereviz", "Brokoli", "Balık", "Kırmızı Et"];
const TARGET_SPEEDS: &[&str] = &["slow", "normal", "fast"];
const DIET_WORKOUT_TYPES: &[&str] = &["none", "light", "moderate", "intense"];
const WATER_INTAKES: &[&str] = &["low", "medium", "high"];
const STRUGGLES: &[&str] = &["sweet_cravings", "night_eating", "portion_control", "motivation"];
const CHEAT_MEALS: &[&str] = &["0", "1", "2", "3"];

const FITNESS_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];
const EXERCISE_GOALS: &[&str] = &["lose_weight", "muscle_build", "endurance", "flexibility"];
const EQUIPMENTS: &[&str] = &["bodyweight", "home_equipment", "gym"];
const EQUIPMENT_DETAILS: &[&str] = &[
    "Dambıl",
    "Mat",
    "Direnç Bandı",
    "Kettlebell",
    "Barfiks Barı",
    "Bench/Sehpa",
    "Koşu Bandı",
];
const DURATIONS: &[&str] = &["15", "30", "45", "60"];
const EXERCISE_DAYS: &[&str] = &["3", "7", "14", "28"];
const DAYS_PER_WEEK: &[&str] = &["2", "3", "4", "5", "6"];
const FOCUS_AREAS: &[&str] = &["full_body", "upper_body", "lower_body", "core", "cardio"];
const SPLITS: &[&str] = &["full_body", "upper_lower", "ppl", "regional"];
const EXERCISE_WORKOUT_TYPES: &[&str] = &["mixed", "strength", "hiit", "pilates_yoga"];
const DISLIKED_EXERCISES: &[&str] = &["Burpee", "Şınav", "Plank", "Lunge", "Squat", "Zıplama"];
const WORKOUT_TIMES: &[&str] = &["morning", "afternoon", "evening"];

/// Build a plausible random form for `category`.
pub fn random_form<R: Rng + ?Sized>(category: GenerationCategory, rng: &mut R) -> GenerationForm {
    let fields = match category {
        GenerationCategory::DietGeneration => diet_fields(rng),
        GenerationCategory::ExerciseGeneration => exercise_fields(rng),
    };
    GenerationForm { category, fields }
}

fn diet_fields<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    let weight: u32 = rng.random_range(45..=120);
    let target_weight = weight.saturating_sub(rng.random_range(5..=20));

    let mut form = body_fields(rng);
    form.insert("weight".to_owned(), weight.to_string());
    form.insert("target_weight".to_owned(), target_weight.to_string());
    form.insert("activity_level".to_owned(), pick(rng, ACTIVITY_LEVELS));
    form.insert("goal".to_owned(), pick(rng, DIET_GOALS));
    form.insert("diet_type".to_owned(), pick(rng, DIET_TYPES));
    form.insert("meals_count".to_owned(), pick(rng, MEAL_COUNTS));
    form.insert("days".to_owned(), pick(rng, DIET_DAYS));
    form.insert("cuisine_preference".to_owned(), pick(rng, CUISINES));
    form.insert("chronic_diseases".to_owned(), pick_several(rng, CHRONIC_DISEASES, 0, 2));
    form.insert("allergies".to_owned(), pick_several(rng, ALLERGIES, 0, 2));
    form.insert("dislikes".to_owned(), pick_several(rng, FOOD_DISLIKES, 0, 3));
    form.insert("target_speed".to_owned(), pick(rng, TARGET_SPEEDS));
    form.insert("workout_type".to_owned(), pick(rng, DIET_WORKOUT_TYPES));
    form.insert("water_intake".to_owned(), pick(rng, WATER_INTAKES));
    form.insert("biggest_struggle".to_owned(), pick(rng, STRUGGLES));
    form.insert("cheat_meals_per_week".to_owned(), pick(rng, CHEAT_MEALS));
    form.insert("wake_up_time".to_owned(), clock_time(rng, 5, 8));
    form.insert("sleep_time".to_owned(), clock_time(rng, 21, 23));
    form
}

fn exercise_fields<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    let weight: u32 = rng.random_range(45..=120);
    let equipment = pick(rng, EQUIPMENTS);
    let equipment_details = if equipment == "bodyweight" {
        String::new()
    } else {
        pick_several(rng, EQUIPMENT_DETAILS, 1, 4)
    };

    let mut form = body_fields(rng);
    form.insert("weight".to_owned(), weight.to_string());
    form.insert("fitness_level".to_owned(), pick(rng, FITNESS_LEVELS));
    form.insert("goal".to_owned(), pick(rng, EXERCISE_GOALS));
    form.insert("equipment".to_owned(), equipment);
    form.insert("equipment_details".to_owned(), equipment_details);
    form.insert("duration".to_owned(), pick(rng, DURATIONS));
    form.insert("days".to_owned(), pick(rng, EXERCISE_DAYS));
    form.insert("days_per_week".to_owned(), pick(rng, DAYS_PER_WEEK));
    form.insert("focus_area".to_owned(), pick(rng, FOCUS_AREAS));
    form.insert("split_preference".to_owned(), pick(rng, SPLITS));
    form.insert("workout_type".to_owned(), pick(rng, EXERCISE_WORKOUT_TYPES));
    form.insert("disliked_exercises".to_owned(), pick_several(rng, DISLIKED_EXERCISES, 0, 3));
    form.insert("workout_time_preference".to_owned(), pick(rng, WORKOUT_TIMES));
    form
}

fn body_fields<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<String, String> {
    let age: u32 = rng.random_range(18..=65);
    let height: u32 = rng.random_range(150..=200);
    let mut form = BTreeMap::new();
    form.insert("gender".to_owned(), pick(rng, GENDERS));
    form.insert("age".to_owned(), age.to_string());
    form.insert("height".to_owned(), height.to_string());
    form
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).map_or_else(String::new, |s| (*s).to_owned())
}

/// Between `min` and `max` distinct options, comma-joined.
fn pick_several<R: Rng + ?Sized>(rng: &mut R, options: &[&str], min: usize, max: usize) -> String {
    let upper = max.min(options.len());
    let count = if min >= upper {
        upper
    } else {
        rng.random_range(min..=upper)
    };
    let mut shuffled = options.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count);
    shuffled.join(", ")
}

fn clock_time<R: Rng + ?Sized>(rng: &mut R, from_hour: u32, to_hour: u32) -> String {
    let hour = rng.random_range(from_hour..=to_hour);
    let minute: u32 = rng.random_range(0..60);
    format!("{hour:02}:{minute:02}")
}
