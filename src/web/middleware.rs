//! Extractors that build `Ctx` values from requests, plus CSRF validation.
//!
//! ```text
//! Host HTTP request
//!   ↓
//! RequestAdapter (session already resolved)
//!   ↓
//! extract_unauthed() / extract_authed()
//!   ↓
//! validate_csrf() for state-changing verbs
//!   ↓
//! Api operation with the context
//! ```
//!
//! Nothing here checks permissions; that is the permission gate's job.

use crate::context::Ctx;
use crate::error::{Violation, ViolationKind};
use crate::state::{Authed, Unauthed};

use super::{ExtractMetadata, ExtractTaintedInputs, HttpVerb, RequestAdapter, TaintedInputs};

/// An unchecked context and the request's tainted inputs.
///
/// ```
/// use deskgate::web::{extract_unauthed, HttpVerb, RequestAdapter};
/// use deskgate::Session;
///
/// let adapter = RequestAdapter::new("req-001", HttpVerb::Get, "get_boot", Session::guest());
/// let extraction = extract_unauthed(&adapter, "en");
///
/// assert_eq!(extraction.context.request_id(), "req-001");
/// assert!(extraction.context.principal().is_none());
/// ```
#[derive(Debug)]
pub struct UnauthenticatedExtraction {
    /// Context that may belong to a guest
    pub context: Ctx<Unauthed>,
    /// Untrusted inputs
    pub inputs: TaintedInputs,
}

/// A logged-in context and the request's tainted inputs.
#[derive(Debug)]
pub struct AuthenticatedExtraction {
    /// Context of a logged-in user
    pub context: Ctx<Authed>,
    /// Untrusted inputs
    pub inputs: TaintedInputs,
}

/// Builds an unchecked context. Never fails; guests are allowed.
pub fn extract_unauthed(adapter: &RequestAdapter, default_lang: &str) -> UnauthenticatedExtraction {
    let meta = adapter.extract_metadata(default_lang);
    let inputs = adapter.extract_tainted_inputs();

    UnauthenticatedExtraction {
        context: Ctx::new_unauthed(meta),
        inputs,
    }
}

/// Builds a logged-in context.
///
/// # Errors
///
/// `Violation` of kind `Unauthenticated` when the session is a guest session.
///
/// ```
/// use deskgate::web::{extract_authed, HttpVerb, RequestAdapter};
/// use deskgate::{Principal, Session};
///
/// let guest = RequestAdapter::new("req-1", HttpVerb::Get, "get_csrf_token", Session::guest());
/// assert!(extract_authed(&guest, "en").is_err());
///
/// let session = Session::for_user("sid", Principal::new("alice@example.com", "Alice"));
/// let user = RequestAdapter::new("req-2", HttpVerb::Get, "get_csrf_token", session);
/// assert_eq!(
///     extract_authed(&user, "en").unwrap().context.user().unwrap().id,
///     "alice@example.com"
/// );
/// ```
pub fn extract_authed(
    adapter: &RequestAdapter,
    default_lang: &str,
) -> Result<AuthenticatedExtraction, Violation> {
    let UnauthenticatedExtraction { context, inputs } = extract_unauthed(adapter, default_lang);

    Ok(AuthenticatedExtraction {
        context: context.authenticate()?,
        inputs,
    })
}

/// Checks the anti-forgery header on state-changing requests.
///
/// Safe verbs and sessions that were never issued a token pass. Otherwise
/// `header` must be present and equal to the session's token.
///
/// # Errors
///
/// `Violation` of kind `CsrfMismatch`.
pub fn validate_csrf<S>(
    ctx: &Ctx<S>,
    inputs: &TaintedInputs,
    verb: HttpVerb,
    header: &str,
) -> Result<(), Violation> {
    if !verb.is_state_changing() {
        return Ok(());
    }
    let Some(expected) = ctx.session().csrf_token() else {
        return Ok(());
    };

    let supplied = inputs.header(header).map(|t| t.into_inner());
    match supplied {
        Some(value) if expected.matches(&value) => Ok(()),
        Some(_) => {
            ctx.log()
                .warn(format_args!("csrf token mismatch on {} request", verb));
            Err(Violation::new(ViolationKind::CsrfMismatch, "Invalid Request"))
        }
        None => {
            ctx.log()
                .warn(format_args!("csrf token missing on {} request", verb));
            Err(Violation::new(ViolationKind::CsrfMismatch, "Invalid Request"))
        }
    }
}
