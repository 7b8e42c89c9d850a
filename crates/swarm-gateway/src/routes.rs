//! Request paths and bodies for every platform endpoint, relative to the
//! API base URL.

use serde_json::{Value, json};
use swarm_types::{
    Catalog, EntityId, GenerationCategory, GenerationForm, LifecycleCategory, SocialAction,
    TelemetryEvent,
};

/// Login endpoint.
pub const LOGIN: &str = "/rejimde/v1/auth/login";

/// Telemetry endpoint.
pub const EVENTS: &str = "/rejimde/v1/events/dispatch";

/// Comment creation endpoint; reviews are rated comments.
pub const COMMENTS: &str = "/rejimde/v1/comments";

/// Listing path for `catalog`, asking for at most `limit` items.
pub fn catalog(catalog: Catalog, limit: u32) -> String {
    match catalog {
        Catalog::Blogs => format!("/wp/v2/posts?per_page={limit}"),
        Catalog::Diets => format!("/rejimde/v1/plans?limit={limit}"),
        Catalog::Exercises => format!("/rejimde/v1/exercises?limit={limit}"),
        Catalog::Leaderboard => format!("/rejimde/v1/gamification/leaderboard?limit={limit}"),
        Catalog::Circles => format!("/rejimde/v1/circles?limit={limit}"),
        Catalog::MyCircle => "/rejimde/v1/circles/my".to_owned(),
        Catalog::Comments { post } => format!("{COMMENTS}?post={post}"),
        Catalog::Experts => format!("/rejimde/v1/professionals?limit={limit}"),
    }
}

/// Start or complete path of a lifecycle item.
pub fn lifecycle(category: LifecycleCategory, item: EntityId, phase: &str) -> String {
    format!("/rejimde/v1/progress/{category}/{item}/{phase}")
}

/// Path and body of a one-shot social action.
pub fn social(action: &SocialAction, target: EntityId) -> (String, Value) {
    match action {
        SocialAction::ReadBlog => (
            format!("/rejimde/v1/progress/blog/{target}/claim"),
            json!({}),
        ),
        SocialAction::LikeComment => (format!("{COMMENTS}/{target}/like"), json!({})),
        SocialAction::FollowUser => (format!("/rejimde/v1/profile/{target}/follow"), json!({})),
        SocialAction::HighFive => (
            format!("/rejimde/v1/profile/{target}/high-five"),
            json!({}),
        ),
        SocialAction::JoinCircle => (format!("/rejimde/v1/circles/{target}/join"), json!({})),
        SocialAction::CommentBlog { body } => (
            COMMENTS.to_owned(),
            json!({ "post": target, "content": body, "context": "blog" }),
        ),
        SocialAction::VisitExpert { slug, view_session } => (
            "/rejimde/v1/profile-views/track".to_owned(),
            json!({ "expert_slug": slug, "session_id": view_session }),
        ),
        SocialAction::Review {
            category,
            rating,
            body,
        } => (
            COMMENTS.to_owned(),
            json!({
                "post": target,
                "content": body,
                "rating": rating,
                "context": category.as_str(),
            }),
        ),
    }
}

/// Generation endpoint and its body.
pub fn generation(category: GenerationCategory, form: &GenerationForm) -> (String, Value) {
    let path = match category {
        GenerationCategory::DietGeneration => "/rejimde/v1/ai/generate-diet",
        GenerationCategory::ExerciseGeneration => "/rejimde/v1/ai/generate-exercise",
    };
    (path.to_owned(), json!(form.fields))
}

/// Body of a telemetry dispatch.
pub fn telemetry(event: TelemetryEvent) -> Value {
    let (entity_type, context) = match event {
        TelemetryEvent::LoginSuccess => (None, Value::Null),
        TelemetryEvent::WaterAdded { amount_ml } => (None, json!({ "amount": amount_ml })),
        TelemetryEvent::MealPhotoUploaded => (Some("meal"), Value::Null),
        TelemetryEvent::StepsLogged { steps } => (None, json!({ "steps": steps })),
        TelemetryEvent::CalculatorSaved { calculator } => {
            (Some("calculator"), json!({ "type": calculator.as_str() }))
        }
    };
    json!({
        "event_type": event.event_type(),
        "entity_type": entity_type,
        "entity_id": Value::Null,
        "context": context,
    })
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use swarm_types::CalculatorKind;

    #[test]
    fn catalog_paths() {
        assert_eq!(catalog(Catalog::Blogs, 10), "/wp/v2/posts?per_page=10");
        assert_eq!(catalog(Catalog::Diets, 20), "/rejimde/v1/plans?limit=20");
        assert_eq!(
            catalog(Catalog::Comments { post: EntityId(5) }, 20),
            "/rejimde/v1/comments?post=5"
        );
    }

    #[test]
    fn lifecycle_paths_use_category_name() {
        assert_eq!(
            lifecycle(LifecycleCategory::Exercise, EntityId(42), "complete"),
            "/rejimde/v1/progress/exercise/42/complete"
        );
    }

    #[test]
    fn review_is_a_rated_comment() {
        let action = SocialAction::Review {
            category: LifecycleCategory::Diet,
            rating: 5,
            body: "Harika".to_owned(),
        };
        let (path, body) = social(&action, EntityId(8));
        assert_eq!(path, COMMENTS);
        assert_eq!(body["post"], 8);
        assert_eq!(body["rating"], 5);
        assert_eq!(body["context"], "diet");
    }

    #[test]
    fn blog_comment_and_expert_visit_bodies() {
        let comment = SocialAction::CommentBlog {
            body: "Çok faydalı".to_owned(),
        };
        let (path, body) = social(&comment, EntityId(5));
        assert_eq!(path, COMMENTS);
        assert_eq!(body["post"], 5);
        assert_eq!(body["context"], "blog");
        assert!(body.get("rating").is_none());

        let visit = SocialAction::VisitExpert {
            slug: "dr-ayse".to_owned(),
            view_session: "bot_1_1700000000000".to_owned(),
        };
        let (path, body) = social(&visit, EntityId(40));
        assert_eq!(path, "/rejimde/v1/profile-views/track");
        assert_eq!(body["expert_slug"], "dr-ayse");
        assert_eq!(body["session_id"], "bot_1_1700000000000");
        assert_eq!(catalog(Catalog::Experts, 20), "/rejimde/v1/professionals?limit=20");
    }

    #[test]
    fn generation_posts_form_fields() {
        let form = GenerationForm {
            category: GenerationCategory::ExerciseGeneration,
            fields: BTreeMap::from([("days".to_owned(), "7".to_owned())]),
        };
        let (path, body) = generation(GenerationCategory::ExerciseGeneration, &form);
        assert!(path.ends_with("generate-exercise"));
        assert_eq!(body["days"], "7");
    }

    #[test]
    fn telemetry_bodies_carry_context() {
        let body = telemetry(TelemetryEvent::WaterAdded { amount_ml: 200 });
        assert_eq!(body["event_type"], "water_added");
        assert_eq!(body["context"]["amount"], 200);

        let body = telemetry(TelemetryEvent::CalculatorSaved {
            calculator: CalculatorKind::Bmi,
        });
        assert_eq!(body["entity_type"], "calculator");
        assert_eq!(body["context"]["type"], CalculatorKind::Bmi.as_str());
    }
}
