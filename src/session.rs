//! Session model.
//!
//! The session store owns and persists sessions. This layer reads the
//! identity and reads or writes the CSRF token; everything else in the data
//! bag is carried along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::{Identity, Principal, GUEST};
use crate::token::CsrfToken;

/// A caller's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id
    pub sid: String,
    /// Owner of the session
    pub user: Identity,
    /// Mutable per-session data
    #[serde(default)]
    pub data: SessionData,
}

impl Session {
    /// The session the framework hands to requests without a valid session cookie.
    pub fn guest() -> Self {
        Self {
            sid: GUEST.to_string(),
            user: Identity::Guest,
            data: SessionData::default(),
        }
    }

    /// A fresh session for a logged-in user.
    pub fn for_user(sid: impl Into<String>, principal: Principal) -> Self {
        Self {
            sid: sid.into(),
            user: Identity::User(principal),
            data: SessionData::default(),
        }
    }

    /// Whether the session belongs to a guest.
    pub fn is_guest(&self) -> bool {
        self.user.is_guest()
    }

    /// Returns the session's CSRF token, if one has been issued.
    ///
    /// A stored empty token counts as no token.
    pub fn csrf_token(&self) -> Option<&CsrfToken> {
        self.data
            .csrf_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())
    }
}

/// The per-session data bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Anti-forgery token, created lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<CsrfToken>,
    /// Everything else the framework keeps in the session
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_session_has_no_token() {
        let session = Session::guest();
        assert!(session.is_guest());
        assert_eq!(session.sid, "Guest");
        assert!(session.csrf_token().is_none());
    }

    #[test]
    fn empty_stored_token_is_absent() {
        let json = serde_json::json!({
            "sid": "sid-1",
            "user": { "kind": "user", "id": "alice@example.com", "name": "Alice" },
            "data": { "csrf_token": "" },
        });

        let session: Session = serde_json::from_value(json).unwrap();
        assert!(session.csrf_token().is_none());
    }

    #[test]
    fn session_data_keeps_unknown_keys() {
        let json = serde_json::json!({
            "csrf_token": "abc123",
            "last_updated": "2024-01-01 00:00:00",
        });

        let data: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(data.csrf_token.as_ref().unwrap().expose_secret(), "abc123");
        assert_eq!(data.extra["last_updated"], "2024-01-01 00:00:00");
    }
}
