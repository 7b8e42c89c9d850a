//! Turning platform responses into [`Outcome`]s, sessions, and listings.
//!
//! The platform wraps most answers in `{status, message, data}`; the
//! generation endpoints use `{success, message, data}` instead, and the
//! `WordPress` post listing is a bare array. Everything here is pure so
//! the rules can be tested without a server.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use swarm_core::GatewayError;
use swarm_types::{EntityId, Listing, Outcome, Session, TelemetryAck};

/// Lowercase fragments the platform uses when an action had already been
/// performed (duplicate follow, already joined, already started, ...).
const ALREADY_APPLIED_MARKERS: &[&str] = &[
    "already",
    "zaten",
    "takipten",
    "ayrılmalısınız",
    "kendinizi takip edemezsiniz",
];

/// Classify a response by HTTP status and decoded body.
///
/// Applied responses carry the envelope's `data` member (or the whole body
/// when there is no envelope).
pub fn classify(status: u16, body: &Value) -> Outcome<Value> {
    if (200..300).contains(&status) && !is_error_envelope(body) {
        let payload = body
            .get("data")
            .cloned()
            .unwrap_or_else(|| body.clone());
        return Outcome::Applied(Some(payload));
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| format!("HTTP {status}"), ToOwned::to_owned);

    if is_already_applied(&message) {
        Outcome::AlreadyApplied(message)
    } else {
        Outcome::Failed(message)
    }
}

/// Whether a platform message says the action was done before.
pub fn is_already_applied(message: &str) -> bool {
    let lowered = message.to_lowercase();
    ALREADY_APPLIED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn is_error_envelope(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("error")
        || body.get("success").and_then(Value::as_bool) == Some(false)
}

/// Build a session from a login response, valid for `ttl` from `now`.
///
/// # Errors
///
/// Returns [`GatewayError::Auth`] when the platform refused the login or
/// the answer carries no token.
pub fn parse_login(
    status: u16,
    body: &Value,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<Session, GatewayError> {
    let data = match classify(status, body) {
        Outcome::Applied(Some(data)) => data,
        Outcome::Applied(None) => Value::Null,
        Outcome::AlreadyApplied(message) | Outcome::Failed(message) => {
            return Err(GatewayError::Auth(message));
        }
    };

    let token = data
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GatewayError::Auth("login response carries no token".to_owned()))?;
    let user_id = data
        .get("user_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| GatewayError::Decode("login response carries no user_id".to_owned()))?;
    let current_streak = data
        .get("current_streak")
        .and_then(Value::as_u64)
        .and_then(|s| u32::try_from(s).ok())
        .unwrap_or(0);

    Ok(Session {
        token: token.to_owned(),
        user_id: EntityId(user_id),
        current_streak,
        expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
    })
}

/// Extract the created entity id from a generation answer.
///
/// A success without an id is reported as failed: nothing usable was
/// produced, so the quota unit should be given back.
pub fn generated_id(outcome: Outcome<Value>) -> Outcome<EntityId> {
    match outcome {
        Outcome::Applied(data) => data
            .as_ref()
            .and_then(|d| d.get("id"))
            .and_then(Value::as_i64)
            .map_or_else(
                || Outcome::Failed("generation response carries no id".to_owned()),
                |id| Outcome::Applied(Some(EntityId(id))),
            ),
        Outcome::AlreadyApplied(message) => Outcome::AlreadyApplied(message),
        Outcome::Failed(message) => Outcome::Failed(message),
    }
}

/// Read the refreshed streak out of a telemetry answer.
pub fn telemetry_ack(data: &Value) -> TelemetryAck {
    TelemetryAck {
        current_streak: data
            .get("current_streak")
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok()),
    }
}

/// Extract listings from a catalog answer.
///
/// Accepts a bare array, an envelope whose `data` (or `comments`) is an
/// array, or an envelope whose `data` is a single object. Items without a
/// numeric id are skipped.
pub fn parse_listings(body: &Value) -> Vec<Listing> {
    let items: Vec<&Value> = if let Some(array) = body.as_array() {
        array.iter().collect()
    } else if let Some(array) = ["data", "comments"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
    {
        array.iter().collect()
    } else if let Some(single) = body.get("data").filter(|d| d.is_object()) {
        vec![single]
    } else {
        Vec::new()
    };

    items.into_iter().filter_map(listing).collect()
}

fn listing(item: &Value) -> Option<Listing> {
    let id = item.get("id").and_then(Value::as_i64)?;
    let title = item
        .get("title")
        .and_then(|t| t.get("rendered").or(Some(t)))
        .and_then(Value::as_str)
        .or_else(|| item.get("name").and_then(Value::as_str))
        .or_else(|| item.get("username").and_then(Value::as_str))
        .unwrap_or_default();
    let author_id = ["author_id", "user_id"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_i64))
        .map(EntityId);
    let slug = item.get("slug").and_then(Value::as_str).map(str::to_owned);
    Some(Listing {
        id: EntityId(id),
        title: title.to_owned(),
        author_id,
        slug,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_is_applied_with_data() {
        let outcome = classify(200, &json!({ "status": "success", "data": { "points": 5 } }));
        assert_eq!(outcome, Outcome::Applied(Some(json!({ "points": 5 }))));
    }

    #[test]
    fn error_envelope_on_200_is_failed() {
        let outcome = classify(200, &json!({ "status": "error", "message": "Plan bulunamadı" }));
        assert_eq!(outcome, Outcome::Failed("Plan bulunamadı".to_owned()));
    }

    #[test]
    fn already_done_markers_are_recognized() {
        for message in [
            "You have already liked this comment",
            "Bu planı zaten başlattınız",
            "Takipten çıkmak için profil sayfasını kullanın",
            "Yeni bir circle'a katılmak için önce mevcut circle'dan ayrılmalısınız",
            "Kendinizi takip edemezsiniz",
        ] {
            let outcome = classify(400, &json!({ "status": "error", "message": message }));
            assert!(
                matches!(outcome, Outcome::AlreadyApplied(_)),
                "{message} should be already applied"
            );
        }
    }

    #[test]
    fn http_error_without_message_is_failed() {
        assert_eq!(classify(503, &Value::Null), Outcome::Failed("HTTP 503".to_owned()));
    }

    #[test]
    fn success_flag_false_is_failed() {
        let outcome = classify(200, &json!({ "success": false, "message": "limit" }));
        assert_eq!(outcome, Outcome::Failed("limit".to_owned()));
    }

    #[test]
    fn login_builds_session_with_ttl() {
        let now = Utc::now();
        let body = json!({
            "status": "success",
            "data": { "token": "abc", "user_id": 17, "current_streak": 4 }
        });
        let session = parse_login(200, &body, now, Duration::days(7)).unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user_id, EntityId(17));
        assert_eq!(session.current_streak, 4);
        assert_eq!(session.expires_at, now + Duration::days(7));
    }

    #[test]
    fn rejected_login_is_auth_error() {
        let body = json!({ "status": "error", "message": "Hatalı şifre" });
        let err = parse_login(403, &body, Utc::now(), Duration::days(7)).unwrap_err();
        assert!(matches!(err, GatewayError::Auth(message) if message == "Hatalı şifre"));
    }

    #[test]
    fn login_without_token_is_auth_error() {
        let body = json!({ "status": "success", "data": { "user_id": 1 } });
        let err = parse_login(200, &body, Utc::now(), Duration::days(7)).unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[test]
    fn generation_needs_an_id() {
        let ok = classify(200, &json!({ "success": true, "data": { "id": 321, "title": "x" } }));
        assert_eq!(generated_id(ok), Outcome::Applied(Some(EntityId(321))));

        let missing = classify(200, &json!({ "success": true, "data": {} }));
        assert!(matches!(generated_id(missing), Outcome::Failed(_)));
    }

    #[test]
    fn telemetry_ack_reads_streak() {
        assert_eq!(
            telemetry_ack(&json!({ "current_streak": 9 })).current_streak,
            Some(9)
        );
        assert_eq!(telemetry_ack(&Value::Null).current_streak, None);
    }

    #[test]
    fn listings_from_wordpress_array() {
        let body = json!([
            { "id": 1, "title": { "rendered": "Su içmenin faydaları" } },
            { "id": 2, "title": { "rendered": "Uyku ve kilo" } },
            { "slug": "no-id" }
        ]);
        let listings = parse_listings(&body);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Su içmenin faydaları");
    }

    #[test]
    fn listings_from_envelopes() {
        let plans = json!({ "status": "success", "data": [{ "id": 7, "title": "Akdeniz" }] });
        assert_eq!(parse_listings(&plans)[0].id, EntityId(7));

        let comments = json!({ "comments": [{ "id": 3, "content": "Güzel" }] });
        assert_eq!(parse_listings(&comments)[0].id, EntityId(3));

        let circle = json!({ "status": "success", "data": { "id": 12, "name": "Sabah Koşucuları" } });
        let mine = parse_listings(&circle);
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Sabah Koşucuları");

        assert!(parse_listings(&json!({ "status": "success", "data": null })).is_empty());
    }

    #[test]
    fn listings_carry_author_and_slug() {
        let comments = json!({ "comments": [
            { "id": 3, "content": "Güzel", "author_id": 10001 },
            { "id": 4, "content": "Misafir" }
        ] });
        let parsed = parse_listings(&comments);
        assert_eq!(parsed[0].author_id, Some(EntityId(10_001)));
        assert_eq!(parsed[1].author_id, None);

        let experts = json!({ "status": "success", "data": [
            { "id": 40, "slug": "dr-ayse", "user_id": 555, "name": "Dr. Ayşe" }
        ] });
        let expert = &parse_listings(&experts)[0];
        assert_eq!(expert.slug.as_deref(), Some("dr-ayse"));
        assert_eq!(expert.author_id, Some(EntityId(555)));
        assert_eq!(expert.title, "Dr. Ayşe");
    }
}
