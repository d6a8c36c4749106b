//! Boot, CSRF and new-document endpoints over an ERP document framework.
//!
//! The crate wraps an existing framework (schema engine, permission engine,
//! session store) behind three operations:
//!
//! - [`Api::get_boot`]: initialization payload for a loading client. Guests
//!   get a minimal payload; users get the framework's boot info plus every
//!   regular doctype.
//! - [`Api::get_csrf_token`]: the session's anti-forgery token, issued on
//!   first use and written through to the session store.
//! - [`Api::get_new_doc`]: a new, unsaved document with defaults applied,
//!   gated on `create` permission.
//!
//! # Core Types
//!
//! - [`Ctx`]: explicit per-request context, `Ctx<Unauthed>` or `Ctx<Authed>`
//! - [`PermissionGate`]: checks permissions and mints [`CreateCap`]
//! - [`CsrfToken`]: session token that redacts itself in logs
//! - [`Tainted<T>`] / [`Verified<T>`]: request values before and after a
//!   [`Sanitizer`]
//! - [`framework`]: traits the host implements for its framework
//! - [`memory::MemoryFramework`]: in-memory implementation of all of them
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use deskgate::memory::MemoryFramework;
//! use deskgate::meta::{DocTypeMeta, FieldMeta, FieldType, PermissionType};
//! use deskgate::web::{extract_authed, HttpVerb, RequestAdapter};
//! use deskgate::{Api, Backend, Config, Principal, Session};
//!
//! let config = Config::default();
//! let fw = Arc::new(MemoryFramework::from_config(&config));
//! fw.add_doctype(
//!     DocTypeMeta::new("ToDo", "Desk")
//!         .field(FieldMeta::new("status", FieldType::Select).options("Open\nClosed")),
//! );
//! fw.grant("alice@example.com", "ToDo", PermissionType::Create);
//!
//! let api = Api::builder(config, Backend::from_memory(fw)).build();
//!
//! let session = Session::for_user("sid-1", Principal::new("alice@example.com", "Alice"));
//! let request = RequestAdapter::new("req-1", HttpVerb::Get, "get_new_doc", session);
//! let ctx = extract_authed(&request, "en").unwrap().context;
//!
//! let doc = api.get_new_doc(&ctx, "ToDo", false).unwrap();
//! assert_eq!(doc.get("status").unwrap(), "Open");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod boot;
mod capability;
pub mod config;
mod context;
mod csrf;
pub mod defaults;
mod document;
mod error;
pub mod framework;
mod gate;
pub mod i18n;
mod logging;
pub mod memory;
pub mod meta;
mod policy;
mod request;
mod sanitizer;
mod scaffold;
mod session;
mod state;
mod tainted;
mod token;
mod verified;
pub mod web;

pub use api::{Api, ApiBuilder, Backend};
pub use boot::{BootPayload, BootProvider, BootVariant};
pub use capability::CreateCap;
pub use config::{Config, ConfigError};
pub use context::Ctx;
pub use csrf::{CsrfTokenResponse, TokenIssuer};
pub use document::NewDocument;
pub use error::{Error, Violation, ViolationKind};
pub use framework::FrameworkError;
pub use gate::{Grants, PermissionGate};
pub use logging::RequestLog;
pub use policy::{CanCreate, PolicyReq};
pub use request::{Identity, Principal, RequestMeta, GUEST};
pub use sanitizer::{
    DoctypeNameSanitizer, FlagSanitizer, SanitizationError, SanitizationErrorKind, Sanitizer,
};
pub use scaffold::DocumentScaffolder;
pub use session::{Session, SessionData};
pub use state::{Authed, Unauthed};
pub use tainted::Tainted;
pub use token::{CsrfToken, RandomHashGenerator, TokenGenerator};
pub use verified::Verified;
