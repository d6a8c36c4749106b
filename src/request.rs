use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// User id the framework assigns to unauthenticated sessions.
pub const GUEST: &str = "Guest";

/// Metadata about an incoming request.
///
/// Carries the request identifier, the caller's session and the language
/// user-facing messages should be rendered in.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Session resolved by the host's session middleware
    pub session: Session,
    /// Language code for localized messages
    pub lang: String,
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User id, usually an email address
    pub id: String,
    /// Display name
    pub name: String,
}

impl Principal {
    /// Creates a principal.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Who a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    /// Not logged in
    #[default]
    Guest,
    /// Logged-in user
    User(Principal),
}

impl Identity {
    /// Returns the user id, `Guest` for guest sessions.
    pub fn user_id(&self) -> &str {
        match self {
            Identity::Guest => GUEST,
            Identity::User(p) => &p.id,
        }
    }

    /// Returns the principal for logged-in sessions.
    ///
    /// A user whose id is the `Guest` marker is a guest, not a principal.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::User(p) if p.id != GUEST => Some(p),
            _ => None,
        }
    }

    /// Whether this is a guest identity.
    pub fn is_guest(&self) -> bool {
        self.principal().is_none()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_id())
    }
}
