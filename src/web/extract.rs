//! Extraction boundary traits for web integration.

use crate::request::RequestMeta;

use super::TaintedInputs;

/// Extracts request metadata from a host request type.
///
/// Implementations only map types. They do not check permissions or
/// sanitize anything.
///
/// ```
/// use deskgate::web::ExtractMetadata;
/// use deskgate::{RequestMeta, Session};
///
/// struct HostRequest {
///     id: String,
///     session: Session,
/// }
///
/// impl ExtractMetadata for HostRequest {
///     fn extract_metadata(&self, default_lang: &str) -> RequestMeta {
///         RequestMeta {
///             request_id: self.id.clone(),
///             session: self.session.clone(),
///             lang: default_lang.to_string(),
///         }
///     }
/// }
/// ```
pub trait ExtractMetadata {
    /// Builds the request metadata, using `default_lang` when the request
    /// does not name a language.
    fn extract_metadata(&self, default_lang: &str) -> RequestMeta;
}

/// Extracts every untrusted input from a host request type.
///
/// All values must come out wrapped in `Tainted`.
pub trait ExtractTaintedInputs {
    /// Collects parameters and headers.
    fn extract_tainted_inputs(&self) -> TaintedInputs;
}
