//! Type-safe identifier wrappers around the platform's numeric ids.
//!
//! Actors are numbered by the local database, while every piece of remote
//! content (blogs, plans, comments, users, circles) carries the platform's
//! own integer id. Keeping them in distinct newtypes prevents an actor id
//! from being sent where a remote entity id is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Local identifier of a simulated actor (database primary key).
    ActorId
}

define_id! {
    /// Identifier of an entity on the remote platform: a blog post, diet
    /// plan, exercise plan, comment, user profile, or circle.
    EntityId
}
