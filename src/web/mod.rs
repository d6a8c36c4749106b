//! HTTP boundary.
//!
//! Contains no web-framework code. The host builds a [`RequestAdapter`] from
//! its own request type (after resolving the session), then either calls
//! [`handle`] for the full method dispatch or uses the extractors directly:
//!
//! ```ignore
//! let AuthenticatedExtraction { context, inputs } =
//!     extract_authed(&adapter, &config.default_language)?;
//! validate_csrf(&context, &inputs, adapter.verb(), &config.csrf.header)?;
//!
//! let doctype = DoctypeNameSanitizer::default().sanitize(inputs.param("doctype")?)?;
//! let doc = api.get_new_doc(&context, doctype.as_ref(), false)?;
//! ```
//!
//! Every parameter and header comes out as `Tainted<String>`.

mod adapter;
mod extract;
mod handlers;
mod middleware;

pub use adapter::{HttpVerb, RequestAdapter, TaintedInputs};
pub use extract::{ExtractMetadata, ExtractTaintedInputs};
pub use handlers::{handle, Response};
pub use middleware::{
    extract_authed, extract_unauthed, validate_csrf, AuthenticatedExtraction,
    UnauthenticatedExtraction,
};
