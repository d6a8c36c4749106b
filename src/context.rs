use std::marker::PhantomData;

use crate::error::{Violation, ViolationKind};
use crate::logging::RequestLog;
use crate::request::{Identity, Principal, RequestMeta};
use crate::session::Session;
use crate::state::{Authed, Unauthed};

/// Per-request execution context.
///
/// Every operation takes the caller's session through this value instead of
/// reading it from ambient request-local state. `Ctx<S>` is generic over its
/// authentication state:
/// - `Ctx<Unauthed>`: session not checked, may be a guest
/// - `Ctx<Authed>`: session belongs to a logged-in user
///
/// ```text
/// Ctx<Unauthed> --authenticate--> Ctx<Authed>
/// ```
///
/// Contexts are built by the web extractors
/// ([`extract_unauthed`](crate::web::extract_unauthed),
/// [`extract_authed`](crate::web::extract_authed)); user code cannot forge one.
#[derive(Debug, Clone)]
pub struct Ctx<S = Authed> {
    request_id: String,
    session: Session,
    lang: String,
    _state: PhantomData<S>,
}

// ============================================================================
// Shared methods (available on all states)
// ============================================================================

impl<S> Ctx<S> {
    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the caller's session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the identity the session belongs to.
    pub fn identity(&self) -> &Identity {
        &self.session.user
    }

    /// Returns the principal if the session belongs to a logged-in user.
    pub fn principal(&self) -> Option<&Principal> {
        self.session.user.principal()
    }

    /// Returns the language for user-facing messages.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Returns a logger that stamps this request's id and user on every event.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id, self.session.user.user_id())
    }

    /// Consumes the context, handing the (possibly updated) session back.
    pub fn into_session(self) -> Session {
        self.session
    }
}

// ============================================================================
// Ctx<Unauthed> - Initial state
// ============================================================================

impl Ctx<Unauthed> {
    /// Creates an unchecked context from request metadata.
    ///
    /// This is `pub(crate)` so only the web extractors can create it.
    pub(crate) fn new_unauthed(meta: RequestMeta) -> Self {
        Self {
            request_id: meta.request_id,
            session: meta.session,
            lang: meta.lang,
            _state: PhantomData,
        }
    }

    /// Checks that the session belongs to a logged-in user.
    ///
    /// # Errors
    ///
    /// Returns a `Violation` of kind `Unauthenticated` for guest sessions.
    pub fn authenticate(self) -> Result<Ctx<Authed>, Violation> {
        if self.session.is_guest() {
            return Err(Violation::new(
                ViolationKind::Unauthenticated,
                "Authentication required: guest session",
            ));
        }

        Ok(Ctx {
            request_id: self.request_id,
            session: self.session,
            lang: self.lang,
            _state: PhantomData,
        })
    }
}

// ============================================================================
// Ctx<Authed> - Logged-in user
// ============================================================================

impl Ctx<Authed> {
    /// Returns the logged-in user.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if the session no longer names a user, which the
    /// type state rules out for sessions built by [`Ctx::authenticate`].
    pub fn user(&self) -> Result<&Principal, Violation> {
        self.session.user.principal().ok_or_else(|| {
            Violation::new(
                ViolationKind::Unauthenticated,
                "Authentication required: guest session",
            )
        })
    }

    /// Mutable access to the session, for the token issuer.
    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

#[cfg(test)]
pub(crate) fn test_ctx(session: Session) -> Ctx<Unauthed> {
    Ctx::new_unauthed(RequestMeta {
        request_id: "req-test".to_string(),
        session,
        lang: "en".to_string(),
    })
}
