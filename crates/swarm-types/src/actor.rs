//! Actor identity, credentials, and cached sessions.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::PersonaClass;
use crate::ids::{ActorId, EntityId};

/// Login credentials for one remote account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Remote username.
    pub username: String,
    /// Remote password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// The remote user this session belongs to.
    pub user_id: EntityId,
    /// Consecutive-day login streak as last reported by the platform.
    pub current_streak: u32,
    /// Instant after which the token must not be reused.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session can still be presented at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A simulated account on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Local identifier.
    pub id: ActorId,
    /// Behavioral archetype.
    pub persona: PersonaClass,
    /// Remote user id, known after the first successful login.
    pub remote_user_id: Option<EntityId>,
    /// Remote login credentials.
    pub credentials: Credentials,
    /// Provisioning batch the actor was created in.
    pub batch_id: Option<String>,
    /// Disabled actors are skipped by the scheduler.
    pub enabled: bool,
    /// Cached session from a previous run.
    pub session: Option<Session>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            username: "fit_ayse".to_owned(),
            password: "hunter2".to_owned(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("fit_ayse"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn session_validity_is_strictly_before_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_owned(),
            user_id: EntityId(5),
            current_streak: 0,
            expires_at: now,
        };
        assert!(!session.is_valid_at(now));
        assert!(session.is_valid_at(now - Duration::seconds(1)));
    }
}
