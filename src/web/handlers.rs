//! Method dispatch with the framework's JSON envelopes.
//!
//! Successful calls answer `{"message": <result>}`. Failures answer
//! `{"exc_type": <name>, "_server_messages": <encoded messages>}` with the
//! status code the framework uses for that error class.

use serde::Serialize;
use serde_json::{json, Value};

use crate::api::Api;
use crate::context::Ctx;
use crate::error::{Error, Violation, ViolationKind};
use crate::framework::FrameworkError;
use crate::sanitizer::{DoctypeNameSanitizer, FlagSanitizer, Sanitizer};
use crate::session::Session;
use crate::state::Unauthed;
use crate::Tainted;

use super::{extract_unauthed, validate_csrf, RequestAdapter, TaintedInputs, UnauthenticatedExtraction};

/// Rendered response for the host's HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// JSON body
    pub body: Value,
    /// Session after the call, for the host to write back
    pub session: Session,
}

enum Failure {
    Api(Error),
    UnknownMethod(String),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Failure::Api(err)
    }
}

impl From<Violation> for Failure {
    fn from(v: Violation) -> Self {
        Failure::Api(Error::Violation(v))
    }
}

impl Failure {
    fn status_and_type(&self) -> (u16, &'static str) {
        match self {
            Failure::UnknownMethod(_) => (404, "DoesNotExistError"),
            Failure::Api(Error::Violation(v)) => match v.kind {
                ViolationKind::Unauthenticated | ViolationKind::PermissionDenied { .. } => {
                    (403, "PermissionError")
                }
                ViolationKind::CsrfMismatch => (400, "CSRFTokenError"),
                ViolationKind::InvalidInput => (417, "ValidationError"),
            },
            Failure::Api(Error::Framework(e)) => match e {
                FrameworkError::DoesNotExist { .. } => (404, "DoesNotExistError"),
                FrameworkError::Validation(_) => (417, "ValidationError"),
                FrameworkError::SessionStore(_) | FrameworkError::Internal(_) => {
                    (500, "InternalServerError")
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Failure::UnknownMethod(method) => format!("Method {method} not found"),
            Failure::Api(Error::Violation(v)) => v.message.clone(),
            Failure::Api(Error::Framework(e)) => e.to_string(),
        }
    }
}

/// Runs the method named by `request` and renders the result.
///
/// Recognised methods are `get_boot`, `get_csrf_token` and `get_new_doc`,
/// optionally prefixed by a dotted module path. State-changing verbs are
/// checked against the session's CSRF token first.
///
/// ```
/// use std::sync::Arc;
/// use deskgate::memory::MemoryFramework;
/// use deskgate::web::{handle, HttpVerb, RequestAdapter};
/// use deskgate::{Api, Backend, Config, Session};
///
/// let api = Api::builder(Config::default(), Backend::from_memory(Arc::new(MemoryFramework::new())))
///     .build();
/// let request = RequestAdapter::new("req-1", HttpVerb::Get, "app.api.get_boot", Session::guest());
///
/// let response = handle(&api, &request);
/// assert_eq!(response.status, 200);
/// assert_eq!(response.body["message"]["user"], "Guest");
/// ```
pub fn handle(api: &Api, request: &RequestAdapter) -> Response {
    let UnauthenticatedExtraction { context, inputs } =
        extract_unauthed(request, &api.config().default_language);

    let (session, outcome) = match validate_csrf(
        &context,
        &inputs,
        request.verb(),
        &api.config().csrf.header,
    ) {
        Ok(()) => dispatch(api, method_name(request.method()), context, &inputs),
        Err(v) => (context.into_session(), Err(v.into())),
    };

    match outcome {
        Ok(message) => Response {
            status: 200,
            body: json!({ "message": message }),
            session,
        },
        Err(failure) => {
            let (status, exc_type) = failure.status_and_type();
            let message = failure.message();
            tracing::warn!(
                request_id = %request.request_id(),
                method = %request.method(),
                status,
                exc_type,
                "method call failed: {}",
                message
            );
            Response {
                status,
                body: json!({
                    "exc_type": exc_type,
                    "_server_messages": server_messages(&message),
                }),
                session,
            }
        }
    }
}

fn method_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Encodes messages the way the framework's client expects: a JSON string
/// holding a list of JSON-encoded message objects.
fn server_messages(message: &str) -> String {
    let entry = json!({ "message": message }).to_string();
    Value::Array(vec![Value::String(entry)]).to_string()
}

fn dispatch(
    api: &Api,
    method: &str,
    ctx: Ctx<Unauthed>,
    inputs: &TaintedInputs,
) -> (Session, Result<Value, Failure>) {
    let fallback = ctx.session().clone();

    match method {
        "get_boot" => {
            let result = api.get_boot(&ctx).map_err(Failure::from).and_then(to_json);
            (ctx.into_session(), result)
        }
        "get_csrf_token" => {
            let mut ctx = match ctx.authenticate() {
                Ok(ctx) => ctx,
                Err(v) => return (fallback, Err(v.into())),
            };
            let result = api
                .get_csrf_token(&mut ctx)
                .map_err(Failure::from)
                .and_then(to_json);
            (ctx.into_session(), result)
        }
        "get_new_doc" => {
            let ctx = match ctx.authenticate() {
                Ok(ctx) => ctx,
                Err(v) => return (fallback, Err(v.into())),
            };
            let result = new_doc_args(inputs)
                .map_err(Failure::from)
                .and_then(|(doctype, with_children)| {
                    api.get_new_doc(&ctx, &doctype, with_children)
                        .map_err(Failure::from)
                })
                .and_then(to_json);
            (ctx.into_session(), result)
        }
        other => (fallback, Err(Failure::UnknownMethod(other.to_string()))),
    }
}

fn new_doc_args(inputs: &TaintedInputs) -> Result<(String, bool), Violation> {
    let doctype = inputs.param("doctype").ok_or_else(|| {
        Violation::new(ViolationKind::InvalidInput, "Missing parameter 'doctype'")
    })?;
    let doctype = DoctypeNameSanitizer::default().sanitize(doctype)?;

    let with_children = inputs
        .param("with_mandatory_children")
        .unwrap_or_else(|| Tainted::new(String::new()));
    let with_children = FlagSanitizer.sanitize(with_children)?;

    Ok((doctype.into_inner(), with_children.into_inner()))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, Failure> {
    serde_json::to_value(value)
        .map_err(|e| Failure::Api(FrameworkError::Internal(e.to_string()).into()))
}
