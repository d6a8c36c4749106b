//! Per-session anti-forgery tokens.

use std::sync::Arc;

use serde::Serialize;

use crate::context::Ctx;
use crate::error::Error;
use crate::framework::SessionStore;
use crate::state::Authed;
use crate::token::TokenGenerator;

/// Body returned by [`TokenIssuer::get_csrf_token`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfTokenResponse {
    /// The session's token, in the clear
    pub csrf_token: String,
}

/// Issues the CSRF token bound to the caller's session.
///
/// Tokens are created on first request and then reused for the life of the
/// session. A newly created token is written through to the session store
/// immediately unless running in test mode.
pub struct TokenIssuer {
    generator: Arc<dyn TokenGenerator>,
    sessions: Arc<dyn SessionStore>,
    in_test: bool,
}

impl TokenIssuer {
    /// Creates an issuer. With `in_test` set, new tokens are not persisted.
    pub fn new(
        generator: Arc<dyn TokenGenerator>,
        sessions: Arc<dyn SessionStore>,
        in_test: bool,
    ) -> Self {
        Self {
            generator,
            sessions,
            in_test,
        }
    }

    /// Returns the session's token, creating it if the session has none.
    ///
    /// Two first calls racing on one session may both generate a token; the
    /// session store's last write wins.
    ///
    /// # Errors
    ///
    /// `FrameworkError::SessionStore` if the forced write fails. The token
    /// stays on the in-memory session in that case.
    pub fn get_csrf_token(&self, ctx: &mut Ctx<Authed>) -> Result<CsrfTokenResponse, Error> {
        if let Some(token) = ctx.session().csrf_token() {
            return Ok(CsrfTokenResponse {
                csrf_token: token.expose_secret().to_string(),
            });
        }

        let token = self.generator.generate();
        ctx.log()
            .info(format_args!("issued csrf token {} for session", token));

        let csrf_token = token.expose_secret().to_string();
        ctx.session_mut().data.csrf_token = Some(token);

        if !self.in_test {
            self.sessions.persist(ctx.session())?;
        }

        Ok(CsrfTokenResponse { csrf_token })
    }
}
