//! Request adapter for mapping HTTP requests to deskgate types.

use std::collections::HashMap;
use std::fmt;

use crate::request::RequestMeta;
use crate::session::Session;
use crate::Tainted;

use super::{ExtractMetadata, ExtractTaintedInputs};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpVerb {
    /// Whether requests with this verb must carry the CSRF header.
    pub fn is_state_changing(self) -> bool {
        !matches!(self, HttpVerb::Get)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        })
    }
}

/// Framework-agnostic view of one method call.
///
/// The host's HTTP layer builds one of these per request, after its session
/// middleware has resolved the caller's [`Session`]. Header names are matched
/// case-insensitively.
///
/// ```
/// use deskgate::web::{HttpVerb, RequestAdapter, ExtractMetadata, ExtractTaintedInputs};
/// use deskgate::Session;
///
/// let mut adapter = RequestAdapter::new("req-1", HttpVerb::Get, "get_boot", Session::guest());
/// adapter.add_header("Accept-Language", "de-DE,de;q=0.9");
/// adapter.add_param("doctype", "ToDo");
///
/// let meta = adapter.extract_metadata("en");
/// assert_eq!(meta.lang, "de");
/// assert!(adapter.extract_tainted_inputs().param("doctype").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    verb: HttpVerb,
    method: String,
    session: Session,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl RequestAdapter {
    /// Creates an adapter with no parameters or headers.
    pub fn new(
        request_id: impl Into<String>,
        verb: HttpVerb,
        method: impl Into<String>,
        session: Session,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            verb,
            method: method.into(),
            session,
            params: HashMap::new(),
            headers: HashMap::new(),
        }
    }

    /// Adds a query-string or form parameter.
    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Adds a header.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the HTTP verb.
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// Returns the called method name, possibly dotted (`app.api.get_boot`).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the caller's session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn language(&self) -> Option<String> {
        let header = self.headers.get("accept-language")?;
        let first = header.split(',').next()?.split(';').next()?.trim();
        let primary = first.split('-').next()?.trim();
        if primary.is_empty() || primary == "*" || !primary.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }
        Some(primary.to_ascii_lowercase())
    }
}

impl ExtractMetadata for RequestAdapter {
    fn extract_metadata(&self, default_lang: &str) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id.clone(),
            session: self.session.clone(),
            lang: self.language().unwrap_or_else(|| default_lang.to_string()),
        }
    }
}

impl ExtractTaintedInputs for RequestAdapter {
    fn extract_tainted_inputs(&self) -> TaintedInputs {
        TaintedInputs {
            params: self
                .params
                .iter()
                .map(|(k, v)| (k.clone(), Tainted::new(v.clone())))
                .collect(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Tainted::new(v.clone())))
                .collect(),
        }
    }
}

/// Untrusted values carried by a request.
#[derive(Debug, Clone, Default)]
pub struct TaintedInputs {
    params: HashMap<String, Tainted<String>>,
    headers: HashMap<String, Tainted<String>>,
}

impl TaintedInputs {
    /// A parameter by name.
    pub fn param(&self, key: &str) -> Option<Tainted<String>> {
        self.params.get(key).cloned()
    }

    /// A header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<Tainted<String>> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Number of parameters.
    pub fn params_count(&self) -> usize {
        self.params.len()
    }
}
